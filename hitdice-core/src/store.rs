//! Character persistence port.
//!
//! The host owns character documents. [`CharacterStore`] is the narrow
//! surface this crate writes through; [`InMemoryCharacterStore`] backs
//! tests and headless use.

use crate::character::{Character, CharacterId, FieldUpdate, ItemId, UpdateOptions};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Fetch a snapshot of a character document.
    async fn load(&self, id: CharacterId) -> Result<Character, StoreError>;

    /// Write one namespaced flag value.
    async fn set_value(
        &self,
        id: CharacterId,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Write a batch of field updates in one call.
    async fn update_fields(
        &self,
        id: CharacterId,
        updates: &[FieldUpdate],
        options: UpdateOptions,
    ) -> Result<(), StoreError>;

    /// Delete embedded items.
    async fn delete_items(&self, id: CharacterId, item_ids: &[ItemId]) -> Result<(), StoreError>;
}

/// Store backed by an in-process map.
#[derive(Default)]
pub struct InMemoryCharacterStore {
    characters: RwLock<HashMap<CharacterId, Character>>,
}

impl InMemoryCharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a character document.
    pub async fn insert(&self, character: Character) {
        self.characters.write().await.insert(character.id, character);
    }
}

#[async_trait]
impl CharacterStore for InMemoryCharacterStore {
    async fn load(&self, id: CharacterId) -> Result<Character, StoreError> {
        self.characters
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::CharacterNotFound(id))
    }

    async fn set_value(
        &self,
        id: CharacterId,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        let character = characters
            .get_mut(&id)
            .ok_or(StoreError::CharacterNotFound(id))?;
        character.flags.set(namespace, key, value);
        tracing::debug!(character = %id, namespace, key, "Set flag");
        Ok(())
    }

    async fn update_fields(
        &self,
        id: CharacterId,
        updates: &[FieldUpdate],
        options: UpdateOptions,
    ) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        let character = characters
            .get_mut(&id)
            .ok_or(StoreError::CharacterNotFound(id))?;

        // Validate against a copy so a bad path leaves the stored document untouched.
        let mut updated = character.clone();
        for update in updates {
            updated.apply(update)?;
        }
        *character = updated;

        tracing::debug!(
            character = %id,
            fields = updates.len(),
            suppress_refresh = options.suppress_refresh,
            "Updated fields"
        );
        Ok(())
    }

    async fn delete_items(&self, id: CharacterId, item_ids: &[ItemId]) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        let character = characters
            .get_mut(&id)
            .ok_or(StoreError::CharacterNotFound(id))?;
        character.remove_items(item_ids);
        tracing::debug!(character = %id, count = item_ids.len(), "Deleted items");
        Ok(())
    }
}

/// Persist a batch, then mirror it onto the local document.
pub async fn commit(
    store: &dyn CharacterStore,
    character: &mut Character,
    updates: &[FieldUpdate],
    options: UpdateOptions,
) -> Result<(), StoreError> {
    if updates.is_empty() {
        return Ok(());
    }
    store.update_fields(character.id, updates, options).await?;
    for update in updates {
        character.apply(update)?;
    }
    Ok(())
}
