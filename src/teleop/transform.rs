//! # Transform Lookup
//!
//! The goal dispatcher asks for exactly one frame transform per goal attempt
//! through [`TransformLookup`]. [`StaticTransformTree`] answers from a fixed
//! set of parent/child edges loaded at startup.

use std::collections::HashMap;

use super::geometry::Transform;
use crate::error::{Result, TeleopError};

/// Point in time a transform is requested for.
///
/// Goals are always placed against the most recent transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePoint {
    /// Most recent transform available.
    Latest,
}

/// Source of frame-to-frame transforms.
///
/// Implementations must not block: a transform that is not available right
/// now is a failure, not something to wait for.
#[cfg_attr(test, mockall::automock)]
pub trait TransformLookup {
    /// Returns the transform that maps coordinates in `source_frame` into
    /// `target_frame`.
    fn lookup_transform(
        &self,
        target_frame: &str,
        source_frame: &str,
        at: TimePoint,
    ) -> Result<Transform>;
}

/// Fixed parent → child edges, looked up directly or inverted.
///
/// Only single edges are resolved; chains are not walked.
#[derive(Debug, Clone, Default)]
pub struct StaticTransformTree {
    edges: HashMap<(String, String), Transform>,
}

impl StaticTransformTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pose of `child` expressed in `parent`.
    pub fn insert(&mut self, parent: &str, child: &str, transform: Transform) {
        self.edges
            .insert((parent.to_string(), child.to_string()), transform);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl TransformLookup for StaticTransformTree {
    fn lookup_transform(
        &self,
        target_frame: &str,
        source_frame: &str,
        _at: TimePoint,
    ) -> Result<Transform> {
        if target_frame == source_frame {
            return Ok(Transform::IDENTITY);
        }

        let key = (target_frame.to_string(), source_frame.to_string());
        if let Some(tf) = self.edges.get(&key) {
            return Ok(*tf);
        }

        let reversed = (source_frame.to_string(), target_frame.to_string());
        if let Some(tf) = self.edges.get(&reversed) {
            return Ok(tf.inverse());
        }

        Err(TeleopError::Transform {
            target_frame: target_frame.to_string(),
            source_frame: source_frame.to_string(),
            reason: "no static transform between these frames".to_string(),
        })
    }
}
