//! Path template matching.
//!
//! # Responsibilities
//! - Compile a resource template (`/users/{id}/posts/{postId}`) into a regex
//! - Match a request pathname and bind placeholder values by name
//!
//! # Design Decisions
//! - A placeholder matches exactly one non-empty, non-`/` run of characters
//! - Literal text is escaped; matching is case-sensitive and anchored
//! - A single trailing slash on the request path is tolerated
//! - Captured values are percent-decoded; undecodable values are kept raw

use std::collections::BTreeMap;

use regex::Regex;

/// A compiled resource template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compile a template such as `/users/{id}`.
    ///
    /// Placeholders may share a segment with literal text (`/files/{name}.json`).
    /// An empty `{}` or an unclosed `{` is treated as literal text.
    pub fn compile(template: &str) -> Result<Self, regex::Error> {
        let mut body = String::with_capacity(template.len() + 16);
        let mut param_names = Vec::with_capacity(template.matches('{').count());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open + 1..].find('}') else {
                break;
            };
            if len == 0 {
                body.push_str(&regex::escape(&rest[..open + 2]));
                rest = &rest[open + 2..];
                continue;
            }
            body.push_str(&regex::escape(&rest[..open]));
            body.push_str("([^/]+)");
            param_names.push(rest[open + 1..open + 1 + len].to_string());
            rest = &rest[open + 2 + len..];
        }
        body.push_str(&regex::escape(rest));

        if body.len() > 1 && body.ends_with('/') {
            body.pop();
        }
        let pattern = if body.is_empty() || body == "/" {
            "^/$".to_string()
        } else {
            format!("^{body}/?$")
        };

        Ok(Self {
            regex: Regex::new(&pattern)?,
            param_names,
        })
    }

    /// Names of the placeholders, in template order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Match `pathname` and return the bound parameters, or `None`.
    ///
    /// When a name appears twice in one template the last value wins.
    pub fn matches(&self, pathname: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.regex.captures(pathname)?;
        let mut params = BTreeMap::new();
        for (name, value) in self.param_names.iter().zip(captures.iter().skip(1)) {
            let Some(value) = value else { continue };
            let raw = value.as_str();
            let decoded = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            params.insert(name.clone(), decoded);
        }
        Some(params)
    }
}
