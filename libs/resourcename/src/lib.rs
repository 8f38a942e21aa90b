//! Resource name helpers
//!
//! Resource names are `/`-separated alternations of collection ids and resource ids,
//! e.g. `publishers/123/books/les-miserables`.

pub mod error;

pub use error::{Error, Result};

/// All segments in order. An empty name has no segments.
pub fn segments(name: &str) -> impl Iterator<Item = &str> {
    let mut parts = name.split('/');
    if name.is_empty() {
        // `split` yields one empty segment for an empty input.
        parts.next();
    }
    parts
}

pub fn segment_count(name: &str) -> usize {
    segments(name).count()
}

/// The segment at `index`; negative indices count from the end (`-1` is the last).
pub fn segment(name: &str, index: isize) -> Option<&str> {
    let position = if index < 0 {
        segment_count(name).checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    segments(name).nth(position)
}

/// The name without its last collection/id pair: `publishers/1/books/2` has the
/// parent `publishers/1`. Top level names have no parent.
pub fn parent(name: &str) -> Option<&str> {
    let mut cut = name.rsplitn(3, '/');
    let _id = cut.next()?;
    let _collection = cut.next()?;
    cut.next().filter(|parent| !parent.is_empty())
}

/// Non-empty, no leading or trailing slash, no empty segments.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.starts_with('/') {
        return Err(Error::LeadingSlash(name.to_string()));
    }
    if name.ends_with('/') {
        return Err(Error::TrailingSlash(name.to_string()));
    }
    match segments(name).position(str::is_empty) {
        Some(index) => Err(Error::EmptySegment {
            name: name.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

/// Join name fragments with single slashes, ignoring slashes at fragment edges and
/// empty fragments.
pub fn join(parts: &[&str]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(part);
    }
    out
}
