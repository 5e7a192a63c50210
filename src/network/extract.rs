//! The data-extraction pipeline: classify a response, parse it, run the JSON
//! transforms and pull out the configured values.

use alloc::{
    boxed::Box,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::fmt;
use embassy_time::Duration;
use regex_automata::meta::Regex;
use serde_json::Value;

use super::{ContentKind, DEFAULT_TIMEOUT, Request, Response, Transport};
use crate::text::TransformResult;
use crate::{Error, Result};

/// Post-processing step run on the parsed JSON document before extraction.
pub type JsonTransform = Box<dyn Fn(&mut Value) -> TransformResult>;

/// One step of a [`PathSpec`].
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum PathKey {
    /// Object member name.
    #[display("{_0}")]
    Key(String),
    /// Array index; negative values count from the end.
    #[display("{_0}")]
    Index(isize),
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<i32> for PathKey {
    fn from(index: i32) -> Self {
        Self::Index(index as isize)
    }
}

/// A walk from the root of a JSON document to one value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSpec(Vec<PathKey>);

/// Build a [`PathSpec`] from keys and indices.
///
/// ```rust
/// use matrix_portal::network::{PathKey, PathSpec};
/// use matrix_portal::path;
///
/// let spec = path!["list", -1, "name"];
/// assert_eq!(spec.keys()[1], PathKey::Index(-1));
/// ```
#[macro_export]
macro_rules! path {
    ($($key:expr),* $(,)?) => {
        $crate::network::PathSpec::new([$($crate::network::PathKey::from($key)),*])
    };
}

impl PathSpec {
    /// A path through `keys`, in order.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = PathKey>) -> Self {
        Self(keys.into_iter().collect())
    }

    /// The steps of the path.
    #[must_use]
    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    /// Follow the path through `document`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyLookup`] naming the first key that is missing, out of
    /// range or applied to the wrong kind of value.
    pub fn traverse<'a>(&self, document: &'a Value) -> Result<&'a Value> {
        self.0.iter().try_fold(document, |node, key| {
            let next = match (key, node) {
                (PathKey::Key(name), Value::Object(members)) => members.get(name),
                (PathKey::Index(index), Value::Array(items)) => {
                    resolve_index(*index, items.len()).and_then(|index| items.get(index))
                }
                _ => None,
            };
            next.ok_or_else(|| Error::KeyLookup {
                key: key.to_string(),
            })
        })
    }
}

impl<K: Into<PathKey>> FromIterator<K> for PathSpec {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index.unsigned_abs())
    }
}

/// A compiled pattern whose first capture group is the extracted value.
#[derive(Clone, Debug)]
pub struct RegexPath {
    pattern: String,
    regex: Regex,
}

impl RegexPath {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if it doesn't compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|err| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as given.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Capture group 1 of the first match in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] when nothing matches or group 1 took no part
    /// in the match.
    pub fn capture<'h>(&self, text: &'h str) -> Result<&'h str> {
        let mut captures = self.regex.create_captures();
        self.regex.captures(text, &mut captures);
        captures
            .get_group(1)
            .map(|span| &text[span.range()])
            .ok_or_else(|| Error::NoMatch {
                pattern: self.pattern.clone(),
            })
    }
}

/// What to fetch and what to pull out of the reply.
pub struct ExtractionSpec {
    url: String,
    headers: Vec<(String, String)>,
    json_paths: Vec<PathSpec>,
    regex_paths: Vec<RegexPath>,
    json_transforms: Vec<JsonTransform>,
    unwrap_single: bool,
    timeout: Duration,
}

impl fmt::Debug for ExtractionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionSpec")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("json_paths", &self.json_paths)
            .field("regex_paths", &self.regex_paths)
            .field("json_transforms", &self.json_transforms.len())
            .field("unwrap_single", &self.unwrap_single)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ExtractionSpec {
    fn default() -> Self {
        Self::new("")
    }
}

impl ExtractionSpec {
    /// Fetch `url` and return its body as one value.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            json_paths: Vec::new(),
            regex_paths: Vec::new(),
            json_transforms: Vec::new(),
            unwrap_single: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Extract one value per path from a JSON reply. Takes priority over
    /// regular expressions.
    #[must_use]
    pub fn with_json_paths(mut self, paths: impl IntoIterator<Item = PathSpec>) -> Self {
        self.json_paths = paths.into_iter().collect();
        self
    }

    /// Extract capture group 1 of each pattern from a text reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that doesn't compile.
    pub fn with_regex_paths<'p>(
        mut self,
        patterns: impl IntoIterator<Item = &'p str>,
    ) -> Result<Self> {
        self.regex_paths = patterns
            .into_iter()
            .map(RegexPath::new)
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Append a transform to run on the parsed JSON document.
    #[must_use]
    pub fn with_json_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&mut Value) -> TransformResult + 'static,
    {
        self.json_transforms.push(Box::new(transform));
        self
    }

    /// Append several boxed transforms, in order.
    #[must_use]
    pub fn with_json_transforms(
        mut self,
        transforms: impl IntoIterator<Item = JsonTransform>,
    ) -> Self {
        self.json_transforms.extend(transforms);
        self
    }

    /// Whether a single extracted value comes back as [`Extracted::Scalar`].
    #[must_use]
    pub const fn with_unwrap_single(mut self, unwrap_single: bool) -> Self {
        self.unwrap_single = unwrap_single;
        self
    }

    /// Request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the spec at another URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Replace the request headers.
    pub fn set_headers(&mut self, headers: Vec<(String, String)>) {
        self.headers = headers;
    }

    /// The URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers, in order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// JSON paths.
    #[must_use]
    pub fn json_paths(&self) -> &[PathSpec] {
        &self.json_paths
    }

    /// Compiled regular expressions.
    #[must_use]
    pub fn regex_paths(&self) -> &[RegexPath] {
        &self.regex_paths
    }

    /// Whether single values are unwrapped.
    #[must_use]
    pub const fn unwrap_single(&self) -> bool {
        self.unwrap_single
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The request this spec describes.
    #[must_use]
    pub fn request(&self) -> Request<'_> {
        Request {
            url: &self.url,
            headers: &self.headers,
            timeout: self.timeout,
        }
    }

    /// Shape extracted values the way this spec asks for.
    #[must_use]
    pub fn normalize(&self, values: Vec<Value>) -> Extracted {
        if self.unwrap_single {
            Extracted::from_values(values)
        } else {
            Extracted::Sequence(values)
        }
    }
}

/// Result of a fetch: one value, or all of them in extraction order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extracted {
    /// Exactly one value, unwrapped.
    Scalar(Value),
    /// Every value, in order.
    Sequence(Vec<Value>),
}

impl Extracted {
    /// [`Scalar`](Self::Scalar) for exactly one value, otherwise [`Sequence`](Self::Sequence).
    #[must_use]
    pub fn from_values(mut values: Vec<Value>) -> Self {
        match values.pop() {
            Some(value) if values.is_empty() => Self::Scalar(value),
            Some(value) => {
                values.push(value);
                Self::Sequence(values)
            }
            None => Self::Sequence(values),
        }
    }

    /// Borrow the values in order, scalar or not.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Scalar(value) => core::slice::from_ref(value),
            Self::Sequence(values) => values,
        }
    }

    /// The values in order, scalar or not.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::Sequence(values) => values,
        }
    }
}

/// Run the pipeline on a response already in hand.
///
/// JSON bodies are parsed (up to `json_budget` bytes) and passed through the
/// spec's transforms. Then: with JSON paths, one value per path; for text
/// with regular expressions, one capture per pattern; otherwise the whole
/// body as a single string, JSON re-serialized in compact form with sorted keys.
///
/// # Errors
///
/// - [`Error::Transport`] for a status other than 200.
/// - [`Error::OutOfMemory`] for a JSON body over budget.
/// - [`Error::Parse`] for malformed JSON.
/// - [`Error::Transform`] naming the failed transform.
/// - [`Error::KeyLookup`] or [`Error::NoMatch`] when a value can't be found.
pub fn extract(spec: &ExtractionSpec, response: &Response, json_budget: usize) -> Result<Vec<Value>> {
    if response.status_code != 200 {
        warn!("extract: HTTP status {}", response.status_code);
        return Err(Error::Transport {
            status_code: response.status_code,
            reason: response.reason.clone(),
        });
    }

    let kind = response.content_kind();
    let mut document = match kind {
        ContentKind::Json => Some(parse_json(&response.body, json_budget)?),
        ContentKind::Text | ContentKind::Image => None,
    };

    if let Some(document) = document.as_mut() {
        for (index, transform) in spec.json_transforms.iter().enumerate() {
            transform(document).map_err(|message| {
                error!("extract: json transform {} failed", index);
                Error::Transform { index, message }
            })?;
        }
    }

    match document {
        Some(document) if !spec.json_paths.is_empty() => spec
            .json_paths
            .iter()
            .map(|path| path.traverse(&document).cloned())
            .collect(),
        Some(document) => Ok(vec![Value::String(document.to_string())]),
        None if kind == ContentKind::Text && !spec.regex_paths.is_empty() => {
            let text = response.text();
            spec.regex_paths
                .iter()
                .map(|regex_path| {
                    regex_path
                        .capture(&text)
                        .map(|captured| Value::String(captured.to_string()))
                })
                .collect()
        }
        None => Ok(vec![Value::String(response.text().into_owned())]),
    }
}

/// Fetch `spec.url` through `transport`, then [`extract`] and
/// [`normalize`](ExtractionSpec::normalize).
///
/// # Errors
///
/// Transport failures, then everything [`extract`] reports.
pub async fn fetch_and_extract<T: Transport>(
    spec: &ExtractionSpec,
    transport: &mut T,
    json_budget: usize,
) -> Result<Extracted> {
    info!("network: retrieving data from {}", spec.url.as_str());
    let response = transport.get(&spec.request()).await?;
    info!(
        "network: reply {} ({} bytes of {})",
        response.status_code,
        response.body.len(),
        response.content_kind().name()
    );
    let values = extract(spec, &response, json_budget)?;
    debug!("network: extracted {} values", values.len());
    Ok(spec.normalize(values))
}

fn parse_json(body: &[u8], json_budget: usize) -> Result<Value> {
    if body.len() > json_budget {
        error!(
            "extract: {} byte JSON body is over the {} byte budget",
            body.len(),
            json_budget
        );
        return Err(Error::OutOfMemory {
            size: body.len(),
            budget: json_budget,
        });
    }
    serde_json::from_slice(body).map_err(|err| Error::Parse {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    })
}
