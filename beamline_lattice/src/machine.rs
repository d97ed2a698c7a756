//! Machine model: element registry plus definitions.
//!
//! All mutation goes through [`MachineModel`] methods. Each one validates its
//! input, builds a complete new [`LatticeSnapshot`] and swaps it in, so a
//! reader holding the previous `Arc` never sees a half-applied change.

use std::collections::HashSet;
use std::sync::Arc;

use beamline_common::definitions::LatticeDefinitions;
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::drift::LatticeItem;
use crate::element::{Element, ElementArena};
use crate::error::{BuildDiagnostic, LatticeError, LatticeResult};
use crate::layout::LayoutView;
use crate::query::ElementQuery;
use crate::snapshot::LatticeSnapshot;

/// Element registry with derived sections and layouts.
#[derive(Debug, Clone)]
pub struct MachineModel {
    definitions: LatticeDefinitions,
    snapshot: Arc<LatticeSnapshot>,
}

impl MachineModel {
    /// Empty registry.
    ///
    /// # Errors
    /// `Config` if `definitions` fail validation.
    pub fn new(definitions: LatticeDefinitions) -> LatticeResult<Self> {
        definitions.validate()?;
        let snapshot = Arc::new(LatticeSnapshot::build(ElementArena::new(), &definitions));
        Ok(Self {
            definitions,
            snapshot,
        })
    }

    /// Registry populated from `elements`.
    ///
    /// # Errors
    /// `DuplicateElement` if a name occurs twice, `InvalidElement` for
    /// elements failing validation, `Config` for invalid definitions.
    pub fn with_elements<I>(definitions: LatticeDefinitions, elements: I) -> LatticeResult<Self>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut model = Self::new(definitions)?;
        model.append(elements)?;
        Ok(model)
    }

    /// Merge `elements` into the registry and rebuild.
    ///
    /// Existing names are replaced in place and keep their registry
    /// position. Nothing changes if any element is rejected.
    ///
    /// # Errors
    /// `DuplicateElement` if the batch names an element twice,
    /// `InvalidElement` if an element fails validation.
    pub fn append<I>(&mut self, elements: I) -> LatticeResult<()>
    where
        I: IntoIterator<Item = Element>,
    {
        let batch = collect_batch(elements)?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut arena = self.snapshot.elements().clone();
        let mut replaced = 0usize;
        for element in batch {
            if arena.insert(element.name.clone(), element).is_some() {
                replaced += 1;
            }
        }
        debug!(total = arena.len(), replaced, "Merged elements");
        self.rebuild(arena);
        Ok(())
    }

    /// Same as [`append`](Self::append).
    pub fn update<I>(&mut self, elements: I) -> LatticeResult<()>
    where
        I: IntoIterator<Item = Element>,
    {
        self.append(elements)
    }

    /// Insert or replace one element.
    pub fn insert(&mut self, element: Element) -> LatticeResult<()> {
        self.append([element])
    }

    /// Remove `name` from the registry and rebuild.
    ///
    /// # Errors
    /// `ElementNotFound` if `name` is not registered.
    pub fn remove(&mut self, name: &str) -> LatticeResult<Element> {
        let mut arena = self.snapshot.elements().clone();
        let removed = arena
            .shift_remove(name)
            .ok_or_else(|| LatticeError::ElementNotFound {
                name: name.to_string(),
            })?;
        debug!(element = %name, "Removed element");
        self.rebuild(arena);
        Ok(removed)
    }

    /// Replace the definitions and rebuild.
    ///
    /// # Errors
    /// `Config` if `definitions` fail validation; the model is unchanged.
    pub fn set_definitions(&mut self, definitions: LatticeDefinitions) -> LatticeResult<()> {
        definitions.validate()?;
        info!(
            machine = %definitions.machine.name,
            sections = definitions.sections.len(),
            layouts = definitions.layouts.len(),
            "Lattice definitions replaced"
        );
        self.definitions = definitions;
        self.rebuild(self.snapshot.elements().clone());
        Ok(())
    }

    /// Set or clear the fallback path used by path resolution.
    ///
    /// # Errors
    /// `UnknownPath` if `path` names no layout.
    pub fn set_default_path(&mut self, path: Option<&str>) -> LatticeResult<()> {
        if let Some(path) = path {
            if !self.definitions.layouts.contains_key(path) {
                return Err(LatticeError::UnknownPath {
                    path: path.to_string(),
                });
            }
        }
        let path = path.map(str::to_string);
        self.definitions.default_path = path.clone();
        Arc::make_mut(&mut self.snapshot).set_default_path(path);
        Ok(())
    }

    fn rebuild(&mut self, arena: ElementArena) {
        self.snapshot = Arc::new(LatticeSnapshot::build(arena, &self.definitions));
    }

    pub fn definitions(&self) -> &LatticeDefinitions {
        &self.definitions
    }

    /// Current snapshot; stays valid after later mutations.
    pub fn snapshot(&self) -> Arc<LatticeSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn get_element(&self, name: &str) -> Option<&Element> {
        self.snapshot.get_element(name)
    }

    pub fn require_element(&self, name: &str) -> LatticeResult<&Element> {
        self.snapshot.require_element(name)
    }

    pub fn layout(&self, path: &str) -> Option<LayoutView<'_>> {
        self.snapshot.layout(path)
    }

    pub fn diagnostics(&self) -> &[BuildDiagnostic] {
        self.snapshot.diagnostics()
    }

    /// See [`LatticeSnapshot::elements_between`].
    pub fn elements_between(&self, query: &ElementQuery) -> LatticeResult<Vec<String>> {
        self.snapshot.elements_between(query)
    }

    /// See [`LatticeSnapshot::create_drifts`].
    pub fn create_drifts(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        path: Option<&str>,
    ) -> LatticeResult<IndexMap<String, LatticeItem<'_>>> {
        self.snapshot.create_drifts(start, end, path)
    }

    /// See [`LatticeSnapshot::get_elements_s_pos`].
    pub fn get_elements_s_pos(&self, path: Option<&str>) -> LatticeResult<IndexMap<String, f64>> {
        self.snapshot.get_elements_s_pos(path)
    }
}

fn collect_batch<I>(elements: I) -> LatticeResult<Vec<Element>>
where
    I: IntoIterator<Item = Element>,
{
    let batch: Vec<Element> = elements.into_iter().collect();
    {
        let mut seen = HashSet::with_capacity(batch.len());
        for element in &batch {
            element.validate()?;
            if !seen.insert(element.name.as_str()) {
                return Err(LatticeError::DuplicateElement {
                    name: element.name.clone(),
                });
            }
        }
    }
    Ok(batch)
}

/// Machine model behind a single-writer lock.
///
/// Readers take [`snapshot`](Self::snapshot) and query it without holding
/// the lock.
#[derive(Debug, Clone)]
pub struct SharedMachineModel {
    inner: Arc<RwLock<MachineModel>>,
}

impl SharedMachineModel {
    pub fn new(model: MachineModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn snapshot(&self) -> Arc<LatticeSnapshot> {
        self.inner.read().snapshot()
    }

    /// Read access to the model (blocks writers while held).
    pub fn read(&self) -> RwLockReadGuard<'_, MachineModel> {
        self.inner.read()
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut MachineModel) -> R) -> R {
        f(&mut *self.inner.write())
    }

    pub fn append<I>(&self, elements: I) -> LatticeResult<()>
    where
        I: IntoIterator<Item = Element>,
    {
        self.write(|m| m.append(elements))
    }

    pub fn remove(&self, name: &str) -> LatticeResult<Element> {
        self.write(|m| m.remove(name))
    }

    pub fn set_definitions(&self, definitions: LatticeDefinitions) -> LatticeResult<()> {
        self.write(|m| m.set_definitions(definitions))
    }

    pub fn set_default_path(&self, path: Option<&str>) -> LatticeResult<()> {
        self.write(|m| m.set_default_path(path))
    }
}
