//! Provider registry: the index from keys to providers by level.

use std::collections::{BTreeMap, HashMap};

use crate::descriptors::ProviderDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::level::Level;
use crate::provider::Provider;

/// Every registered provider, indexed by each key it covers and by level.
///
/// The registry is validated as a whole on every registration. Once the
/// resolver hands it to scopes it is shared read-only behind an `Arc`.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    bindings: HashMap<Key, BTreeMap<Level, Provider>>,
    providers: Vec<Provider>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds every provider or none of them.
    ///
    /// Fails with `InvalidProvider` for malformed providers, `Conflict` when
    /// a `(key, level)` pair is already bound, and `LevelOrder` when a
    /// dependency is only provided above the dependent's level.
    pub(crate) fn register_all<I>(&mut self, providers: I) -> DiResult<()>
    where
        I: IntoIterator<Item = Provider>,
    {
        let mut staged = self.clone();
        for provider in providers {
            provider.validate()?;
            staged.insert(provider)?;
        }
        staged.check_level_order()?;
        *self = staged;
        Ok(())
    }

    fn insert(&mut self, provider: Provider) -> DiResult<()> {
        let level = provider.level();
        let coverage = provider.coverage();

        if let Some(taken) = coverage.iter().find(|key| {
            self.bindings
                .get(key)
                .is_some_and(|levels| levels.contains_key(&level))
        }) {
            return Err(DiError::Conflict {
                key: taken.display_name(),
                level,
            });
        }

        for key in coverage {
            self.bindings
                .entry(key)
                .or_default()
                .insert(level, provider.clone());
        }
        self.providers.push(provider);
        Ok(())
    }

    fn check_level_order(&self) -> DiResult<()> {
        for provider in &self.providers {
            for dependency in provider.dependencies() {
                let Some(levels) = self.bindings.get(dependency) else {
                    // No provider anywhere: may be seeded, reported at resolution.
                    continue;
                };
                if levels.range(..=provider.level()).next_back().is_some() {
                    continue;
                }
                if let Some(available_level) = levels.keys().next() {
                    return Err(DiError::LevelOrder {
                        provider: provider.name(),
                        provider_level: provider.level(),
                        dependency: dependency.display_name(),
                        available_level: *available_level,
                    });
                }
            }
        }
        Ok(())
    }

    /// The provider bound to `key` with the greatest level not above
    /// `max_level`.
    pub(crate) fn find(&self, key: &Key, max_level: Level) -> Option<&Provider> {
        self.bindings
            .get(key)?
            .range(..=max_level)
            .next_back()
            .map(|(_, provider)| provider)
    }

    pub(crate) fn lookup(&self, key: &Key, max_level: Level) -> DiResult<&Provider> {
        self.find(key, max_level).ok_or(DiError::MissingProvider {
            key: key.display_name(),
            level: max_level,
        })
    }

    pub(crate) fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers
            .iter()
            .map(|provider| {
                let levels = provider
                    .dependencies()
                    .iter()
                    .map(|dep| self.find(dep, provider.level()).map(Provider::level))
                    .collect();
                ProviderDescriptor::new(provider, levels)
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.providers.len()
    }
}
