//! Parser for the `###`-delimited headline block returned by the research call.
//!
//! Expected shape:
//!
//! ```text
//! ###
//! Title: <headline>
//! Description: <why this headline works>
//! ###
//! Title: ...
//! ```

use std::sync::LazyLock;

use regex::Regex;

use copycraft_shared::{Angle, AngleId};

/// Block separator in the research response.
pub const ANGLE_DELIMITER: &str = "###";

/// Most angles ever returned from one research call.
pub const MAX_ANGLES: usize = 10;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// `Title: <rest of line>`. The capture never crosses a line break and may
/// be empty, which drops the block.
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Title:[ \t]*(.*)$").expect("title regex"));

/// `Description: <rest of line>`.
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Description:[ \t]*(.*)$").expect("description regex"));

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse up to [`MAX_ANGLES`] angles from `raw`, in block order.
///
/// Blocks missing either label are dropped. Malformed or empty input yields
/// an empty list.
pub fn parse_angles(raw: &str) -> Vec<Angle> {
    raw.split(ANGLE_DELIMITER)
        .filter(|block| !block.trim().is_empty())
        .filter_map(parse_block)
        .take(MAX_ANGLES)
        .collect()
}

fn parse_block(block: &str) -> Option<Angle> {
    let title = first_capture(&TITLE_RE, block)?;
    let description = first_capture(&DESCRIPTION_RE, block)?;

    Some(Angle {
        id: AngleId::new(),
        title,
        description,
    })
}

fn first_capture(re: &Regex, block: &str) -> Option<String> {
    let value = re.captures(block)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}
