//! Grounding metadata → deduplicated citation list.

use std::collections::HashMap;

use copycraft_shared::{GroundingMetadata, Source};

/// Extract the cited web pages from grounding metadata.
///
/// Chunks missing a uri or a title are skipped. Sources are keyed by uri:
/// the title kept for a uri is the one from its *last* chunk, while the list
/// order follows each uri's *first* appearance.
pub fn extract_sources(metadata: Option<&GroundingMetadata>) -> Vec<Source> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };

    let mut sources: Vec<Source> = Vec::new();
    let mut index_by_uri: HashMap<&str, usize> = HashMap::new();

    for chunk in &metadata.grounding_chunks {
        let Some(web) = chunk.web.as_ref() else {
            continue;
        };
        let (Some(uri), Some(title)) = (web.uri.as_deref(), web.title.as_deref()) else {
            continue;
        };
        if uri.is_empty() || title.is_empty() {
            continue;
        }

        match index_by_uri.get(uri) {
            Some(&i) => sources[i].title = title.to_string(),
            None => {
                index_by_uri.insert(uri, sources.len());
                sources.push(Source {
                    title: title.to_string(),
                    uri: uri.to_string(),
                });
            }
        }
    }

    sources
}
