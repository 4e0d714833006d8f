//! Three passes over the entity stream: index what matters, resolve the ways that relations
//! need, then cache coordinates and emit denormalized records.

use butterfly_common::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::cache::{CoordinateCache, DEFAULT_BATCH_SIZE};
use crate::codec::NodeCoord;
use crate::entity::{trim_tags, Category, Entity, MemberKind, Node, Relation, Way};
use crate::geometry::{relation_geometry, way_geometry, MemberGeometry};
use crate::index::IdIndex;
use crate::output::{LatLon, Record, RecordSink};
use crate::source::EntitySource;
use crate::store::KeyValueStore;
use crate::tags::TagFilter;

#[derive(Debug, Clone)]
pub struct Options {
    /// Queued cache writes that trigger a batch write
    pub batch_size: usize,
    /// Include resolved node coordinates in way records
    pub way_nodes: bool,
    /// Spinner on stderr while passes run
    pub progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            way_nodes: false,
            progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub filter: TagFilter,
    pub options: Options,
    /// Index snapshot: read if present, otherwise written after indexing
    pub index_path: Option<PathBuf>,
}

impl Config {
    pub fn new(filter: TagFilter) -> Self {
        Self {
            filter,
            options: Options::default(),
            index_path: None,
        }
    }
}

/// Counters for the emit pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub nodes_seen: u64,
    pub ways_seen: u64,
    pub relations_seen: u64,
    pub nodes_cached: u64,
    pub way_refs_cached: u64,
    pub nodes_emitted: u64,
    pub ways_emitted: u64,
    pub relations_emitted: u64,
    /// Matching ways dropped because a node was missing from the cache
    pub ways_skipped: u64,
    /// Matching relations dropped because no geometry could be built
    pub relations_skipped: u64,
}

impl RunStats {
    pub fn emitted(&self) -> u64 {
        self.nodes_emitted + self.ways_emitted + self.relations_emitted
    }

    fn log(&self) {
        log::info!(
            "seen {} nodes, {} ways, {} relations",
            self.nodes_seen,
            self.ways_seen,
            self.relations_seen
        );
        log::info!(
            "cached {} nodes, {} way node lists",
            self.nodes_cached,
            self.way_refs_cached
        );
        log::info!(
            "emitted {} nodes, {} ways, {} relations (skipped {} ways, {} relations)",
            self.nodes_emitted,
            self.ways_emitted,
            self.relations_emitted,
            self.ways_skipped,
            self.relations_skipped
        );
    }
}

/// Rejects a stream that goes back to an earlier category, and reports category changes
#[derive(Debug, Default)]
struct StreamOrder {
    current: Option<Category>,
}

impl StreamOrder {
    /// Returns true when `next` starts a new category
    fn advance(&mut self, next: Category) -> Result<bool> {
        match self.current {
            Some(current) if next < current => Err(Error::StreamOrder {
                previous: current.name(),
                found: next.name(),
            }),
            Some(current) if next == current => Ok(false),
            _ => {
                self.current = Some(next);
                Ok(true)
            }
        }
    }
}

fn spinner(enabled: bool, pass: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {prefix}: {pos} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(pass);
    pb.set_message("entities");
    pb
}

/// Pass 1: mark matching entities and everything they reference
pub fn build_index(source: &mut dyn EntitySource, filter: &TagFilter, progress: bool) -> Result<IdIndex> {
    let started = Instant::now();
    let index = IdIndex::new();
    let pb = spinner(progress, "index");
    let mut order = StreamOrder::default();

    source.for_each_entity(&mut |entity| {
        order.advance(entity.category())?;
        pb.inc(1);

        if !filter.matches(entity.tags()) {
            return Ok(());
        }
        match &entity {
            Entity::Node(node) => index.nodes.insert(node.id),
            Entity::Way(way) => index.mark_way(way),
            Entity::Relation(relation) => {
                if !index.mark_relation(relation) {
                    log::debug!("relation {} has no way members, skipped", relation.id);
                }
            }
        }
        Ok(())
    })?;

    pb.finish_and_clear();
    log::info!("pass 1 (index) done in {:.2?}", started.elapsed());
    index.log_stats();
    Ok(index)
}

/// Pass 2: mark the nodes of ways that only matter as relation members.
///
/// Skipped without reading the stream when no relation references a way; returns whether the
/// pass ran.
pub fn resolve_relation_ways(
    source: &mut dyn EntitySource,
    index: &IdIndex,
    progress: bool,
) -> Result<bool> {
    if index.rel_ways.is_empty() {
        log::info!("pass 2 (relation ways) skipped, no relation references a way");
        return Ok(false);
    }

    let started = Instant::now();
    let pb = spinner(progress, "relation ways");
    let mut order = StreamOrder::default();

    source.for_each_entity(&mut |entity| {
        order.advance(entity.category())?;
        pb.inc(1);

        if let Entity::Way(way) = &entity {
            if index.rel_ways.has(way.id) {
                index.mark_relation_way_nodes(way);
            }
        }
        Ok(())
    })?;

    pb.finish_and_clear();
    log::info!("pass 2 (relation ways) done in {:.2?}", started.elapsed());
    index.log_stats();
    Ok(true)
}

/// State of the emit pass
struct Emitter<'a, S: KeyValueStore, W: Write> {
    index: &'a IdIndex,
    cache: CoordinateCache<S>,
    sink: &'a mut RecordSink<W>,
    options: &'a Options,
    stats: RunStats,
}

impl<S: KeyValueStore, W: Write> Emitter<'_, S, W> {
    fn node(&mut self, node: Node) -> Result<()> {
        self.stats.nodes_seen += 1;

        if self.index.is_cached_node(node.id) {
            self.cache.queue_node(node.id, &NodeCoord::from_node(&node));
            self.cache.flush_if_full()?;
            self.stats.nodes_cached += 1;
        }

        if self.index.nodes.has(node.id) {
            self.sink.write(&Record::Node {
                id: node.id,
                lat: node.lat,
                lon: node.lon,
                tags: trim_tags(&node.tags),
            })?;
            self.stats.nodes_emitted += 1;
        }
        Ok(())
    }

    fn way(&mut self, way: Way) -> Result<()> {
        self.stats.ways_seen += 1;

        if self.index.rel_ways.has(way.id) {
            self.cache.queue_way_refs(way.id, &way.refs);
            self.cache.flush_if_full()?;
            self.stats.way_refs_cached += 1;
        }

        if !self.index.ways.has(way.id) {
            return Ok(());
        }

        let Some(coords) = self.cache.lookup_way_nodes(way.id, &way.refs)? else {
            self.stats.ways_skipped += 1;
            return Ok(());
        };
        let Some(geometry) = way_geometry(&coords) else {
            log::warn!("way {} has no nodes, skipped", way.id);
            self.stats.ways_skipped += 1;
            return Ok(());
        };

        self.sink.write(&Record::Way {
            id: way.id,
            tags: trim_tags(&way.tags),
            centroid: (&geometry.centroid).into(),
            bounds: (&geometry.bounds).into(),
            nodes: self
                .options
                .way_nodes
                .then(|| coords.iter().map(LatLon::from).collect()),
        })?;
        self.stats.ways_emitted += 1;
        Ok(())
    }

    fn relation(&mut self, relation: Relation) -> Result<()> {
        self.stats.relations_seen += 1;

        if !self.index.relations.has(relation.id) {
            return Ok(());
        }

        let mut members = Vec::with_capacity(relation.members.len());
        let mut resolved_ways = 0;

        for member in &relation.members {
            let coords = match member.kind {
                MemberKind::Node => self.cache.lookup_node(member.id)?.map(|c| vec![c]),
                MemberKind::Way => self.cache.lookup_way_refs_then_nodes(member.id)?,
                MemberKind::Relation => continue,
            };
            let Some(coords) = coords else {
                continue;
            };
            if member.kind == MemberKind::Way {
                resolved_ways += 1;
            }
            members.push(MemberGeometry {
                kind: member.kind,
                role: member.role.clone(),
                coords,
            });
        }

        if resolved_ways == 0 {
            log::warn!("relation {} skipped, no member way could be resolved", relation.id);
            self.stats.relations_skipped += 1;
            return Ok(());
        }

        let Some(geometry) = relation_geometry(&members) else {
            log::warn!("relation {} skipped, failed to compute centroid and bounds", relation.id);
            self.stats.relations_skipped += 1;
            return Ok(());
        };

        self.sink.write(&Record::Relation {
            id: relation.id,
            tags: trim_tags(&relation.tags),
            centroid: (&geometry.centroid).into(),
            bounds: (&geometry.bounds).into(),
        })?;
        self.stats.relations_emitted += 1;
        Ok(())
    }
}

/// Pass 3: cache the coordinates later entities need and emit every matching entity.
///
/// Pending cache writes are flushed durably whenever the stream moves on to ways and again
/// to relations, so every lookup sees all earlier writes.
pub fn emit<S: KeyValueStore, W: Write>(
    source: &mut dyn EntitySource,
    index: &IdIndex,
    cache: CoordinateCache<S>,
    sink: &mut RecordSink<W>,
    options: &Options,
) -> Result<RunStats> {
    let started = Instant::now();
    let pb = spinner(options.progress, "emit");
    let mut order = StreamOrder::default();
    let mut emitter = Emitter {
        index,
        cache,
        sink,
        options,
        stats: RunStats::default(),
    };

    source.for_each_entity(&mut |entity| {
        if order.advance(entity.category())? {
            emitter.cache.flush(true)?;
        }
        pb.inc(1);

        match entity {
            Entity::Node(node) => emitter.node(node),
            Entity::Way(way) => emitter.way(way),
            Entity::Relation(relation) => emitter.relation(relation),
        }
    })?;

    emitter.cache.flush(true)?;
    emitter.sink.flush()?;

    pb.finish_and_clear();
    log::info!("pass 3 (emit) done in {:.2?}", started.elapsed());
    Ok(emitter.stats)
}

/// Run all passes, reading the index snapshot instead of the first two when one exists
pub fn run<S: KeyValueStore, W: Write>(
    source: &mut dyn EntitySource,
    store: S,
    sink: &mut RecordSink<W>,
    config: &Config,
) -> Result<RunStats> {
    let progress = config.options.progress;

    let index = match &config.index_path {
        Some(path) if path.exists() => {
            let index = IdIndex::load(path)?;
            index.log_stats();
            index
        }
        snapshot => {
            let index = build_index(source, &config.filter, progress)?;
            resolve_relation_ways(source, &index, progress)?;
            if let Some(path) = snapshot {
                index.save(path)?;
            }
            index
        }
    };

    let cache = CoordinateCache::new(store, config.options.batch_size);
    let stats = emit(source, &index, cache, sink, &config.options)?;
    stats.log();
    Ok(stats)
}
