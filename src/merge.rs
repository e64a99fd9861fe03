//! Region merge: union one named region across documents and splice it
//! into a base document.
//!
//! A region is delimited by two whole lines, `/// <name>` and
//! `/// end <name>`. Everything outside the base's region is kept byte for
//! byte, so merging the output again with the same inputs reproduces it.

use crate::error::GenError;

pub fn begin_marker(region: &str) -> String {
    format!("/// {}", region)
}

pub fn end_marker(region: &str) -> String {
    format!("/// end {}", region)
}

/// Line indices of the begin and end markers.
fn find(lines: &[&str], region: &str) -> Option<(usize, usize)> {
    let (begin, end) = (begin_marker(region), end_marker(region));
    let b = lines.iter().position(|l| l.trim() == begin)?;
    let e = lines[b + 1..].iter().position(|l| l.trim() == end)? + b + 1;
    Some((b, e))
}

fn split(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect()
}

/// Body lines of `region` in `text`, or `None` when a marker is missing.
pub fn extract<'t>(text: &'t str, region: &str) -> Option<Vec<&'t str>> {
    let lines = split(text);
    let (b, e) = find(&lines, region)?;
    Some(lines[b + 1..e].to_vec())
}

#[derive(Debug)]
pub struct Merged {
    pub text: String,
    /// One [`GenError::MergeMarker`] per document lacking the region.
    pub warnings: Vec<GenError>,
}

/// Replace the body of `region` in `base` with the union of that region
/// across `inputs` (`(name, text)` pairs): source order, identical lines
/// kept once. Inputs without the region contribute nothing; a base without
/// it is returned unchanged.
pub fn merge_region(base: &str, inputs: &[(String, String)], region: &str) -> Merged {
    let mut warnings = Vec::new();
    let lines = split(base);
    let Some((b, e)) = find(&lines, region) else {
        warnings.push(GenError::MergeMarker {
            document: "base".to_string(),
            region: region.to_string(),
        });
        return Merged {
            text: base.to_string(),
            warnings,
        };
    };

    let mut body: Vec<&str> = Vec::new();
    for (name, text) in inputs {
        match extract(text, region) {
            Some(contribution) => {
                for line in contribution {
                    if !body.contains(&line) {
                        body.push(line);
                    }
                }
            }
            None => warnings.push(GenError::MergeMarker {
                document: name.clone(),
                region: region.to_string(),
            }),
        }
    }

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + body.len());
    out.extend_from_slice(&lines[..=b]);
    out.extend(body);
    out.extend_from_slice(&lines[e..]);
    Merged {
        text: out.join("\n"),
        warnings,
    }
}
