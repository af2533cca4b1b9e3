use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use snyk_sync_core::{AppError, AppResult};

use crate::ResourceType;

/// Pagination progress for one resource scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    resource_type: ResourceType,
    resource_id: Option<String>,
    token: String,
}

impl PageState {
    /// Creates a frame positioned at the start of the collection.
    #[must_use]
    pub fn new(resource_type: ResourceType, resource_id: Option<String>) -> Self {
        Self {
            resource_type,
            resource_id,
            token: String::new(),
        }
    }

    /// Returns the resource type walked by this frame.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the upstream cursor for the next page, empty at the start.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SerializedPageBag {
    states: Vec<PageState>,
    current_state: Option<PageState>,
}

/// Stack of pagination frames carried between listing calls.
///
/// The bag holds no state outside its serialized form, so presenting the
/// same token twice resumes at the same page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBag {
    states: Vec<PageState>,
    current_state: Option<PageState>,
}

impl PageBag {
    /// Decodes a serialized bag. The empty string yields an empty bag.
    pub fn unmarshal(serialized: &str) -> AppResult<Self> {
        let serialized = serialized.trim();
        if serialized.is_empty() {
            return Ok(Self::default());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(serialized)
            .map_err(|error| AppError::Decode(format!("invalid page token encoding: {error}")))?;
        let decoded = serde_json::from_slice::<SerializedPageBag>(&bytes)
            .map_err(|error| AppError::Decode(format!("invalid page token payload: {error}")))?;

        Ok(Self {
            states: decoded.states,
            current_state: decoded.current_state,
        })
    }

    /// Encodes the bag. A bag without an active frame encodes as the empty string.
    pub fn marshal(&self) -> AppResult<String> {
        if self.current_state.is_none() {
            return Ok(String::new());
        }

        let payload = serde_json::to_vec(&SerializedPageBag {
            states: self.states.clone(),
            current_state: self.current_state.clone(),
        })
        .map_err(|error| AppError::Internal(format!("failed to encode page token: {error}")))?;

        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    /// Makes `state` the active frame, stacking the previous one.
    pub fn push(&mut self, state: PageState) {
        if let Some(current) = self.current_state.take() {
            self.states.push(current);
        }
        self.current_state = Some(state);
    }

    /// Removes the active frame and reactivates the one beneath it.
    pub fn pop(&mut self) -> Option<PageState> {
        let popped = self.current_state.take();
        self.current_state = self.states.pop();
        popped
    }

    /// Returns the active frame.
    #[must_use]
    pub fn current(&self) -> Option<&PageState> {
        self.current_state.as_ref()
    }

    /// Returns the number of frames, the active one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.states.len() + usize::from(self.current_state.is_some())
    }

    /// Returns the upstream cursor of the active frame, empty when none.
    #[must_use]
    pub fn page_token(&self) -> &str {
        self.current_state
            .as_ref()
            .map(PageState::token)
            .unwrap_or_default()
    }

    /// Advances the active frame to `next_page`, or pops it when the
    /// collection is exhausted.
    pub fn next(&mut self, next_page: Option<&str>) -> AppResult<()> {
        match next_page.filter(|value| !value.is_empty()) {
            None => {
                self.pop();
                Ok(())
            }
            Some(next_page) => {
                let current = self.current_state.as_mut().ok_or_else(|| {
                    AppError::Validation("page token has no active frame to advance".to_owned())
                })?;
                current.token = next_page.to_owned();
                Ok(())
            }
        }
    }

    /// Advances like [`PageBag::next`] and returns the serialized token.
    ///
    /// An empty result means every frame is exhausted.
    pub fn next_token(&mut self, next_page: Option<&str>) -> AppResult<String> {
        self.next(next_page)?;
        self.marshal()
    }
}

/// Decodes `serialized` and makes sure a frame for `resource_type` is active.
///
/// Returns the bag together with the upstream cursor to request, empty when
/// the collection starts from the beginning.
pub fn parse_page_token(
    serialized: &str,
    resource_type: ResourceType,
    resource_id: Option<&str>,
) -> AppResult<(PageBag, String)> {
    let mut bag = PageBag::unmarshal(serialized)?;

    if bag.current().is_none() {
        bag.push(PageState::new(
            resource_type,
            resource_id.map(ToOwned::to_owned),
        ));
    }

    let page = bag.page_token().to_owned();
    Ok((bag, page))
}

/// Extracts the next-page URL from a `Link` response header.
///
/// A link marked `rel="last"` ends pagination, `rel="next"` continues it and
/// a link without any `rel` parameter is treated as the next page.
#[must_use]
pub fn parse_link_header(header: &str) -> Option<String> {
    let mut fallback = None;

    for entry in link_entries(header) {
        let mut parts = entry.split(';');
        let url = parts
            .next()
            .unwrap_or_default()
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim();
        if url.is_empty() {
            continue;
        }

        let rel = parts.find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("rel")
                .then(|| value.trim().trim_matches('"').trim().to_ascii_lowercase())
        });

        match rel.as_deref() {
            Some("next") => return Some(url.to_owned()),
            Some(_) => {}
            None => {
                fallback.get_or_insert_with(|| url.to_owned());
            }
        }
    }

    fallback
}

fn link_entries(header: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();

    for piece in header.split(',') {
        match entries.last_mut() {
            Some(last) if !piece.trim_start().starts_with('<') => {
                last.push(',');
                last.push_str(piece);
            }
            _ => entries.push(piece.to_owned()),
        }
    }

    entries
}
