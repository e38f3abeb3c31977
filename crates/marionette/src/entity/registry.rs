//! # Controller Registry
//!
//! Resolves the configured entity type names once at startup. An unknown or
//! uncontrollable name is a configuration error reported here, never at
//! spawn time.

use std::rc::Rc;

use marionette_core::EntityKind;

use super::controller::{EntityController, GenericMobController, HumanController, PigController};
use crate::error::{MarionetteError, MarionetteResult};
use crate::events::EventPipeline;
use crate::settings::Settings;

/// Whether the framework can drive `kind`.
#[must_use]
pub const fn is_controllable(kind: EntityKind) -> bool {
    !matches!(kind, EntityKind::ZombifiedPig)
}

/// Factory for controllers of every enabled entity type.
pub struct ControllerRegistry {
    kinds: Vec<EntityKind>,
    pipeline: Rc<EventPipeline>,
    remove_from_player_list: bool,
}

impl ControllerRegistry {
    /// Builds the registry from `settings.entity_types`.
    ///
    /// # Errors
    ///
    /// [`MarionetteError::UnsupportedEntityType`] for the first name that does
    /// not resolve to a controllable kind.
    pub fn new(settings: &Settings, pipeline: Rc<EventPipeline>) -> MarionetteResult<Self> {
        let mut kinds = Vec::with_capacity(settings.entity_types.len());
        for name in &settings.entity_types {
            let kind = EntityKind::match_name(name)
                .filter(|kind| is_controllable(*kind))
                .ok_or_else(|| MarionetteError::UnsupportedEntityType(name.clone()))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        tracing::info!(types = kinds.len(), "controller registry ready");

        Ok(Self {
            kinds,
            pipeline,
            remove_from_player_list: settings.remove_players_from_player_list,
        })
    }

    /// Enabled kinds, in configuration order.
    #[must_use]
    pub fn kinds(&self) -> &[EntityKind] {
        &self.kinds
    }

    /// Whether `kind` is enabled.
    #[must_use]
    pub fn supports(&self, kind: EntityKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// The pipeline every created controller shares.
    #[must_use]
    pub fn pipeline(&self) -> &Rc<EventPipeline> {
        &self.pipeline
    }

    /// Creates a fresh controller for `kind`.
    ///
    /// # Errors
    ///
    /// [`MarionetteError::UnsupportedEntityType`] if `kind` is not enabled.
    pub fn create(&self, kind: EntityKind) -> MarionetteResult<Box<dyn EntityController>> {
        if !self.supports(kind) {
            return Err(MarionetteError::UnsupportedEntityType(kind.name().to_owned()));
        }
        let pipeline = Rc::clone(&self.pipeline);
        Ok(match kind {
            EntityKind::Player => Box::new(HumanController::new(pipeline, self.remove_from_player_list)),
            EntityKind::Pig => Box::new(PigController::pig(pipeline)),
            other => Box::new(GenericMobController::new(other, pipeline)),
        })
    }

    /// Creates a controller for a loosely matched type name.
    ///
    /// # Errors
    ///
    /// [`MarionetteError::UnsupportedEntityType`] if the name does not resolve
    /// to an enabled kind.
    pub fn create_by_name(&self, name: &str) -> MarionetteResult<Box<dyn EntityController>> {
        let kind = EntityKind::match_name(name)
            .ok_or_else(|| MarionetteError::UnsupportedEntityType(name.to_owned()))?;
        self.create(kind)
    }
}
