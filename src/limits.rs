//! Limits and constraints for schema and document processing
//!
//! This module defines limits that protect the loader and validators from
//! resource exhaustion on hostile or malformed inputs (deeply nested
//! documents, self-referential schema groups, oversized files).

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting depth when expanding schema group references
    pub max_group_depth: usize,

    /// Maximum element nesting depth in a document tree
    pub max_tree_depth: usize,

    /// Maximum document size in bytes
    pub max_document_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_group_depth: 64,
            max_tree_depth: 1000,
            max_document_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_group_depth: 16,
            max_tree_depth: 100,
            max_document_size: 10 * 1024 * 1024, // 10 MB
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_group_depth: 256,
            max_tree_depth: 10000,
            max_document_size: 1024 * 1024 * 1024, // 1 GB
        }
    }

    /// Check if group expansion depth is within limits
    pub fn check_group_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_group_depth {
            Err(Error::LimitExceeded(format!(
                "group expansion depth {} exceeds maximum {}",
                depth, self.max_group_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if tree depth is within limits
    pub fn check_tree_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_tree_depth {
            Err(Error::LimitExceeded(format!(
                "tree depth {} exceeds maximum {}",
                depth, self.max_tree_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if document size is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::LimitExceeded(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }
}
