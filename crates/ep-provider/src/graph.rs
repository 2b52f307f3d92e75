//! Replay from, and export to, graph archives.

use std::path::Path;
use std::sync::Arc;

use ep_core::{ActivityDictionary, ContainerInfo, DayOfWeek, EpiConfig};
use ep_graph::{ContactGraph, GraphArchive};
use log::{info, warn};

use crate::{DayEvents, EventProvider, ProviderError, ProviderResult};

/// Replays the packed graphs of a [`GraphArchive`].
///
/// Cloning is cheap: clones share the archive.
#[derive(Clone, Debug)]
pub struct GraphProvider {
    archive: Arc<GraphArchive>,
}

impl GraphProvider {
    /// Read the archive at `path`.  Its stored activity names must all be
    /// present in `config.infection_params`.
    pub fn open(path: impl AsRef<Path>, config: &EpiConfig) -> ProviderResult<Self> {
        let archive = GraphArchive::read_from_path(path, &config.infection_params)?;
        Ok(Self::from_archive(archive))
    }

    pub fn from_archive(archive: GraphArchive) -> Self {
        for day in DayOfWeek::ALL {
            match archive.for_day(day) {
                Some((stored, _)) if stored != day => warn!("{day} not stored; replaying {stored}"),
                Some(_) => {}
                None => warn!("{day} not stored and no other day to replay"),
            }
        }
        GraphProvider { archive: Arc::new(archive) }
    }

    pub fn archive(&self) -> &GraphArchive {
        &self.archive
    }
}

impl EventProvider for GraphProvider {
    fn init(&mut self) -> ProviderResult<()> {
        Ok(())
    }

    fn persons(&self) -> &[String] {
        &self.archive.persons
    }

    fn containers(&self) -> &[ContainerInfo] {
        &self.archive.containers
    }

    fn dictionary(&self) -> &Arc<ActivityDictionary> {
        &self.archive.dictionary
    }

    fn for_day(&self, day: DayOfWeek) -> ProviderResult<DayEvents<'_>> {
        let (_, graph) = self.archive.for_day(day).ok_or(ProviderError::NoEvents(day))?;
        Ok(DayEvents::Packed(graph.iter()))
    }
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Pack every weekday of `provider` into an archive.
///
/// A weekday whose events equal those of the last stored weekday is left
/// out; readers fall back to that earlier day.
pub fn build_archive(provider: &dyn EventProvider) -> ProviderResult<GraphArchive> {
    let dictionary = Arc::clone(provider.dictionary());
    let mut archive =
        GraphArchive::new(provider.persons().to_vec(), provider.containers().to_vec(), Arc::clone(&dictionary));

    let mut previous = None;
    for day in DayOfWeek::ALL {
        let events: Vec<_> = provider.for_day(day)?.map(|e| e.to_owned_event()).collect();
        if previous.as_ref() == Some(&events) {
            info!("{day}: same events as the previous stored day, not stored");
            continue;
        }
        archive.set_day(day, Arc::new(ContactGraph::construct(&events, &dictionary)?));
        previous = Some(events);
    }
    Ok(archive)
}

/// [`build_archive`] and write the result to `path`.
pub fn write_archive(path: impl AsRef<Path>, provider: &dyn EventProvider) -> ProviderResult<GraphArchive> {
    let archive = build_archive(provider)?;
    archive.write_to_path(path)?;
    Ok(archive)
}
