//! Store Resolver
//!
//! Binds validated declarations to their strategies and anchors their paths
//! at the project root. Pure: nothing here touches the filesystem.

use crate::path::StorePath;
use crate::schema::{StoreDeclaration, StoreDeclarations, StoreKind};
use crate::strategy::{strategy_for, FormatStrategy};
use std::path::{Path, PathBuf};

/// A declaration ready for one update run.
#[derive(Debug)]
pub struct StoreDescriptor {
    declaration: StoreDeclaration,
    strategy: Box<dyn FormatStrategy>,
    absolute_path: PathBuf,
}

impl StoreDescriptor {
    pub fn new(declaration: StoreDeclaration, root: &Path) -> Self {
        let strategy = strategy_for(&declaration);
        let absolute_path = declaration.path().under(root);
        Self {
            declaration,
            strategy,
            absolute_path,
        }
    }

    pub fn declaration(&self) -> &StoreDeclaration {
        &self.declaration
    }

    pub fn kind(&self) -> StoreKind {
        self.strategy.kind()
    }

    pub fn store_path(&self) -> &StorePath {
        self.declaration.path()
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    pub fn strategy(&self) -> &dyn FormatStrategy {
        self.strategy.as_ref()
    }
}

/// Ordered descriptors for one configuration. Duplicated paths are kept.
#[derive(Debug, Default)]
pub struct VersionSet {
    stores: Vec<StoreDescriptor>,
}

impl VersionSet {
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoreDescriptor> {
        self.stores.iter()
    }

    /// Append a store after the declared ones.
    pub fn push(&mut self, descriptor: StoreDescriptor) {
        self.stores.push(descriptor);
    }
}

impl<'a> IntoIterator for &'a VersionSet {
    type Item = &'a StoreDescriptor;
    type IntoIter = std::slice::Iter<'a, StoreDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.stores.iter()
    }
}

/// Resolve declarations against `root`, keeping declaration order.
pub fn resolve(decls: StoreDeclarations, root: &Path) -> VersionSet {
    VersionSet {
        stores: decls
            .into_vec()
            .into_iter()
            .map(|decl| StoreDescriptor::new(decl, root))
            .collect(),
    }
}
