//! Interactive terminal driver for the writing wizard.
//!
//! Renders each stage, reads the user's choice from stdin, and fires the
//! matching wizard trigger. Prompts and status go to stderr; the outline and
//! the finished article go to stdout.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use copycraft_core::Wizard;
use copycraft_gemini::GenerationClient;
use copycraft_shared::{CopyCraftError, DraftState, Source, Stage, StyleTag};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

/// Values supplied on the command line. Each is used once, on the first
/// visit to its stage; later visits ask interactively.
pub(crate) struct WriteArgs {
    pub topic: Option<String>,
    pub audience: Option<String>,
    /// 1-based.
    pub angle: Option<usize>,
    pub style: Option<StyleTag>,
    pub links: Option<String>,
    pub yes: bool,
    /// `None` disables saving.
    pub out_dir: Option<PathBuf>,
}

/// One interactive run over a wizard.
pub(crate) struct Session<C> {
    wizard: Wizard<C>,
    args: WriteArgs,
    input: Lines<BufReader<Stdin>>,
}

impl<C: GenerationClient> Session<C> {
    pub(crate) fn new(wizard: Wizard<C>, args: WriteArgs) -> Self {
        Self {
            wizard,
            args,
            input: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Loop over stages until the user stops after a finished article.
    pub(crate) async fn run(mut self) -> Result<()> {
        loop {
            print_header(self.wizard.stage());
            match self.wizard.stage() {
                Stage::Topic => self.topic_step().await?,
                Stage::Research => self.research_step().await?,
                Stage::Outline => self.outline_step().await?,
                Stage::Style => self.style_step().await?,
                Stage::Result => {
                    if !self.result_step().await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn topic_step(&mut self) -> Result<()> {
        let topic = match self.args.topic.take() {
            Some(topic) => topic,
            None => self.ask("主题 (topic)").await?,
        };
        let audience = match self.args.audience.take() {
            Some(audience) => audience,
            None => self.ask("目标受众 (audience)").await?,
        };

        let outcome = self.wizard.submit_topic(&topic, &audience).await;
        report(outcome)
    }

    async fn research_step(&mut self) -> Result<()> {
        let angles = self.wizard.angles().to_vec();
        eprint_sources("调研参考来源", &self.wizard.draft().research_sources);

        if angles.is_empty() {
            eprintln!("没有解析到可用的标题，请重新开始。");
            self.ask("按回车重新开始").await?;
            self.wizard.restart();
            return Ok(());
        }

        for (i, angle) in angles.iter().enumerate() {
            eprintln!("  {:>2}. {}", i + 1, angle.title);
            eprintln!("      {}", angle.description);
        }

        let choice = match self.args.angle.take() {
            Some(n) => n.to_string(),
            None => {
                self.ask(&format!("选择标题 [1-{}]，r 重新开始", angles.len()))
                    .await?
            }
        };

        if choice.eq_ignore_ascii_case("r") {
            self.wizard.restart();
            return Ok(());
        }

        match parse_choice(&choice, angles.len()) {
            Some(index) => {
                let outcome = self.wizard.select_angle_at(index).await;
                report(outcome)
            }
            None => {
                eprintln!("无效的选择：{choice}");
                Ok(())
            }
        }
    }

    async fn outline_step(&mut self) -> Result<()> {
        println!("{}", self.wizard.draft().outline);
        println!();

        if self.args.yes {
            let outline = self.wizard.draft().outline.clone();
            return report(self.wizard.confirm_outline(&outline));
        }

        let answer = self
            .ask("回车确认大纲，b 返回，o <文件> 载入修改后的大纲")
            .await?;

        match OutlineAction::parse(&answer) {
            OutlineAction::Accept => {
                let outline = self.wizard.draft().outline.clone();
                report(self.wizard.confirm_outline(&outline))
            }
            OutlineAction::Back => report(self.wizard.back().map(|_| ())),
            OutlineAction::Load(path) => match tokio::fs::read_to_string(&path).await {
                Ok(edited) => {
                    debug!(path = %path.display(), "loaded edited outline");
                    report(self.wizard.confirm_outline(&edited))
                }
                Err(e) => {
                    eprintln!("无法读取 {}: {e}", path.display());
                    Ok(())
                }
            },
        }
    }

    async fn style_step(&mut self) -> Result<()> {
        let preset = self.args.style.take();
        let links = self.args.links.take();

        let (style, links) = match (preset, links) {
            (None, None) => {
                for (i, tag) in StyleTag::ALL.iter().enumerate() {
                    eprintln!("  {}. {}", i + 1, tag.instruction());
                }
                let answer = self
                    .ask(&format!("选择风格 [1-{}]，b 返回", StyleTag::ALL.len()))
                    .await?;
                if answer.eq_ignore_ascii_case("b") {
                    return report(self.wizard.back().map(|_| ()));
                }
                let style = parse_choice(&answer, StyleTag::ALL.len()).map(|i| StyleTag::ALL[i]);
                let links = self.ask("参考链接或账号（可留空）").await?;
                (style, links)
            }
            (style, links) => (style, links.unwrap_or_default()),
        };

        let outcome = self.wizard.select_style(style, &links).await;
        report(outcome)
    }

    /// Show and save the article. Returns whether to start another run.
    async fn result_step(&mut self) -> Result<bool> {
        let markdown = render_markdown(self.wizard.draft());
        println!("{markdown}");

        if let Some(dir) = &self.args.out_dir {
            let path = save_article(dir, &markdown).await?;
            eprintln!("已保存：{}", path.display());
        }

        if self.args.yes {
            return Ok(false);
        }

        let again = self.ask("再写一篇？[y/N]").await?;
        if again.eq_ignore_ascii_case("y") {
            self.wizard.restart();
            return Ok(true);
        }
        Ok(false)
    }

    async fn ask(&mut self, prompt: &str) -> Result<String> {
        eprint!("{prompt}: ");
        let line = self
            .input
            .next_line()
            .await?
            .ok_or_else(|| eyre!("input closed"))?;
        Ok(line.trim().to_string())
    }
}

/// Surface recoverable wizard errors and keep going; bail on the rest.
fn report(outcome: copycraft_shared::Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e @ CopyCraftError::Config { .. }) => Err(e.into()),
        Err(e) => {
            eprintln!("出错了：{e}（可以重试）");
            Ok(())
        }
    }
}

fn print_header(stage: Stage) {
    eprintln!();
    eprintln!("== {}. {} ==", stage.step(), stage.title());
}

fn eprint_sources(heading: &str, sources: &[Source]) {
    if sources.is_empty() {
        return;
    }
    eprintln!("{heading}:");
    for source in sources {
        eprintln!("  - {} <{}>", source.title, source.uri);
    }
}

/// Parse a 1-based menu choice into a 0-based index.
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum OutlineAction {
    Accept,
    Back,
    Load(PathBuf),
}

impl OutlineAction {
    fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.eq_ignore_ascii_case("b") {
            return Self::Back;
        }
        match input.strip_prefix("o ") {
            Some(path) if !path.trim().is_empty() => Self::Load(PathBuf::from(path.trim())),
            _ => Self::Accept,
        }
    }
}

/// Article body followed by a Markdown list of its sources.
fn render_markdown(draft: &DraftState) -> String {
    let mut out = draft.final_content.trim_end().to_string();
    if !draft.article_sources.is_empty() {
        out.push_str("\n\n## 参考来源\n\n");
        for source in &draft.article_sources {
            out.push_str(&format!("- [{}]({})\n", source.title, source.uri));
        }
    }
    out
}

async fn save_article(dir: &Path, markdown: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CopyCraftError::io(dir, e))?;

    let name = format!("article-{}.md", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let path = dir.join(name);
    tokio::fs::write(&path, markdown)
        .await
        .map_err(|e| CopyCraftError::io(&path, e))?;

    info!(path = %path.display(), bytes = markdown.len(), "article saved");
    Ok(path)
}
