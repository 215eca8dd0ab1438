//! Token and zone storage.
//!
//! A [`ZoneStore`] holds every token in play and the contents of every
//! zone instance. Tokens live in exactly one zone; moving is removal
//! plus insertion, never a copy, so the total token count changes only
//! through explicit create/destroy.
//!
//! Zone contents use persistent vectors so snapshots share structure.
//! Insertion position follows the zone's declared ordering discipline:
//! stacks insert at the front, queues at the back, and sets keep their
//! contents sorted by token ordinal so layout is canonical regardless
//! of arrival order.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, Scalar, TokenId};
use crate::def::ZoneOrdering;

/// An identity-bearing game piece with a property bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Unique id, assigned at creation and never reused.
    pub id: TokenId,
    /// Declared type tag.
    pub token_type: String,
    /// Scalar properties.
    pub props: FxHashMap<String, Scalar>,
}

impl Token {
    /// Read a property, defaulting to 0.
    #[must_use]
    pub fn prop(&self, name: &str) -> Scalar {
        self.props.get(name).copied().unwrap_or(0)
    }
}

/// All tokens and zone contents of one game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneStore {
    /// Contents per zone instance id, in zone order.
    contents: FxHashMap<String, Vector<TokenId>>,
    /// Token id -> zone instance id.
    locations: FxHashMap<TokenId, String>,
    /// Token id -> token.
    tokens: FxHashMap<TokenId, Token>,
    /// Next token ordinal.
    next_token: u32,
}

impl ZoneStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contents: FxHashMap::default(),
            locations: FxHashMap::default(),
            tokens: FxHashMap::default(),
            next_token: 0,
        }
    }

    /// Register a zone instance with empty contents.
    pub fn add_zone(&mut self, instance: impl Into<String>) {
        self.contents.entry(instance.into()).or_default();
    }

    /// True if the zone instance exists.
    #[must_use]
    pub fn has_zone(&self, instance: &str) -> bool {
        self.contents.contains_key(instance)
    }

    /// Contents of a zone instance, front to back.
    pub fn contents(&self, instance: &str) -> EngineResult<&Vector<TokenId>> {
        self.contents
            .get(instance)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown zone `{instance}`")))
    }

    /// Number of tokens in a zone instance.
    pub fn count(&self, instance: &str) -> EngineResult<usize> {
        Ok(self.contents(instance)?.len())
    }

    /// The token at the front of a zone, if any.
    pub fn front(&self, instance: &str) -> EngineResult<Option<TokenId>> {
        Ok(self.contents(instance)?.front().copied())
    }

    /// Look up a token.
    pub fn token(&self, id: TokenId) -> EngineResult<&Token> {
        self.tokens
            .get(&id)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown token {id}")))
    }

    /// Mutable token lookup.
    pub fn token_mut(&mut self, id: TokenId) -> EngineResult<&mut Token> {
        self.tokens
            .get_mut(&id)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown token {id}")))
    }

    /// The zone instance a token is in.
    pub fn zone_of(&self, id: TokenId) -> EngineResult<&str> {
        self.locations
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown token {id}")))
    }

    /// Total number of tokens in play.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Iterate all zone instance ids (unordered).
    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.contents.keys().map(String::as_str)
    }

    /// Iterate (zone instance id, contents) pairs (unordered).
    pub fn iter_zones(&self) -> impl Iterator<Item = (&str, &Vector<TokenId>)> {
        self.contents.iter().map(|(id, c)| (id.as_str(), c))
    }

    /// Create a token in a zone and return its id.
    pub fn create_token(
        &mut self,
        token_type: impl Into<String>,
        props: FxHashMap<String, Scalar>,
        zone: &str,
        ordering: ZoneOrdering,
    ) -> EngineResult<TokenId> {
        if !self.has_zone(zone) {
            return Err(EngineError::InternalInvariant(format!(
                "unknown zone `{zone}`"
            )));
        }
        let id = TokenId::new(self.next_token);
        self.next_token += 1;
        self.tokens.insert(
            id,
            Token {
                id,
                token_type: token_type.into(),
                props,
            },
        );
        self.locations.insert(id, zone.to_string());
        self.insert_into(zone, id, ordering);
        Ok(id)
    }

    /// Move a token to another zone.
    pub fn move_token(&mut self, id: TokenId, to: &str, ordering: ZoneOrdering) -> EngineResult<()> {
        if !self.has_zone(to) {
            return Err(EngineError::InternalInvariant(format!("unknown zone `{to}`")));
        }
        let from = self.zone_of(id)?.to_string();
        if let Some(contents) = self.contents.get_mut(&from) {
            if let Some(pos) = contents.iter().position(|&t| t == id) {
                contents.remove(pos);
            }
        }
        self.locations.insert(id, to.to_string());
        self.insert_into(to, id, ordering);
        Ok(())
    }

    /// Destroy a token, removing it from play.
    pub fn destroy_token(&mut self, id: TokenId) -> EngineResult<()> {
        let zone = self.zone_of(id)?.to_string();
        if let Some(contents) = self.contents.get_mut(&zone) {
            if let Some(pos) = contents.iter().position(|&t| t == id) {
                contents.remove(pos);
            }
        }
        self.locations.remove(&id);
        self.tokens.remove(&id);
        Ok(())
    }

    fn insert_into(&mut self, zone: &str, id: TokenId, ordering: ZoneOrdering) {
        let contents = self.contents.entry(zone.to_string()).or_default();
        match ordering {
            ZoneOrdering::Stack => contents.push_front(id),
            ZoneOrdering::Queue => contents.push_back(id),
            ZoneOrdering::Set => {
                let pos = contents
                    .iter()
                    .position(|&t| t.raw() > id.raw())
                    .unwrap_or(contents.len());
                contents.insert(pos, id);
            }
        }
    }
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}
