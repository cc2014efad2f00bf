//! Three-pass inverted-index pair generator for entity graphs.
//!
//! Nodes are entities (records) and two entities are linked by the number of
//! tags they share. Enumerating all record pairs is quadratic, so the builder
//! goes through a tag -> entities inverted index instead:
//!
//! 1. **Scan**: read every record once, merge duplicate ids, intern tags.
//!    Entities are then re-indexed by id so the result does not depend on
//!    record order.
//! 2. **Pairs**: for each tag (in name order) take its posting list, sample or
//!    skip it when it exceeds `max_tag_degree`, and count every pair of its
//!    entities in a [`PairCounter`] that is either exact or capacity-bounded.
//! 3. **Finalize**: the surviving counts go through the shared [`Finalizer`].
//!
//! With `max_tag_degree = None` and no counter capacity the result equals
//! brute-force enumeration of all record pairs sharing a tag.

use crate::bounded::PairCounter;
use crate::config::{EntityGraphConfig, HighDegreePolicy, PairStrategy};
use crate::finalize::Finalizer;
use crate::pair::PairKey;
use crate::progress::{NoProgress, Phase, Progress};
use crate::record::{RecordSource, TaggedRecord};
use crate::report::{BuildOutput, BuildReport};
use crate::{Graph, Link, Point, Result, Warning};
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
struct Entity {
    id: String,
    label: String,
    category: Option<String>,
    first_seen: Option<i64>,
    /// Sorted, de-duplicated tag ids.
    tags: Vec<u32>,
}

/// Output of pass 1.
#[derive(Debug, Default)]
struct Scan {
    entities: Vec<Entity>,
    tag_names: Vec<String>,
    rows_seen: usize,
    rows_skipped: usize,
}

/// Builds entity graphs from a re-iterable record source.
#[derive(Debug, Clone, Default)]
pub struct EntityGraphBuilder {
    config: EntityGraphConfig,
}

impl EntityGraphBuilder {
    pub fn new(config: EntityGraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EntityGraphConfig {
        &self.config
    }

    pub fn build<S: RecordSource + ?Sized>(&self, source: &S) -> Result<BuildOutput> {
        self.build_with_progress(source, &NoProgress)
    }

    pub fn build_with_progress<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        progress: &dyn Progress,
    ) -> Result<BuildOutput> {
        let mut report = BuildReport::default();

        let mut scan = self.scan(source, progress)?;
        report.rows_seen = scan.rows_seen;
        report.rows_skipped = scan.rows_skipped;
        if scan.rows_skipped > 0 {
            report.warn(Warning::InvalidInput {
                skipped: scan.rows_skipped,
            });
        }
        if let Some(max) = self.config.max_entities {
            cap_entities(&mut scan.entities, max);
        }
        scan.entities.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::info!(
            entities = scan.entities.len(),
            tags = scan.tag_names.len(),
            "entity scan complete"
        );

        let postings = inverted_index(&scan);
        let counter = self.count_pairs(&scan, &postings, &mut report, progress);
        report.bounded = counter.is_bounded();
        if let Some(warning) = counter.warning() {
            report.warn(warning);
        }
        report.unique_pairs = counter.len();

        let graph = self.finalize(&scan.entities, counter, &mut report, progress);
        Ok(BuildOutput { graph, report })
    }

    /// Pass 1.
    fn scan<S: RecordSource + ?Sized>(&self, source: &S, progress: &dyn Progress) -> Result<Scan> {
        let mut scan = Scan::default();
        let mut entity_index: AHashMap<String, u32> = AHashMap::new();
        let mut tag_index: AHashMap<String, u32> = AHashMap::new();

        let stats = source.scan(&mut |record: &TaggedRecord| {
            scan.rows_seen += 1;
            progress.update(Phase::Scan, scan.rows_seen, None);

            let id = record.id.trim();
            if id.is_empty() {
                scan.rows_skipped += 1;
                return;
            }
            let mut tags: Vec<u32> = record
                .usable_tags()
                .map(|t| {
                    let t = t.trim();
                    match tag_index.get(t) {
                        Some(&i) => i,
                        None => {
                            let i = scan.tag_names.len() as u32;
                            tag_index.insert(t.to_string(), i);
                            scan.tag_names.push(t.to_string());
                            i
                        }
                    }
                })
                .collect();
            if tags.is_empty() {
                scan.rows_skipped += 1;
                return;
            }

            match entity_index.get(id) {
                Some(&e) => {
                    let entity = &mut scan.entities[e as usize];
                    entity.tags.append(&mut tags);
                    entity.tags.sort_unstable();
                    entity.tags.dedup();
                    entity.first_seen = match (entity.first_seen, record.timestamp) {
                        (Some(a), Some(b)) => Some(a.min(b)),
                        (a, b) => a.or(b),
                    };
                }
                None => {
                    tags.sort_unstable();
                    tags.dedup();
                    entity_index.insert(id.to_string(), scan.entities.len() as u32);
                    scan.entities.push(Entity {
                        id: id.to_string(),
                        label: record.label.clone().unwrap_or_else(|| id.to_string()),
                        category: record.category.clone(),
                        first_seen: record.timestamp,
                        tags,
                    });
                }
            }
        })?;

        scan.rows_seen += stats.rows_malformed;
        scan.rows_skipped += stats.rows_malformed;
        Ok(scan)
    }

    fn use_bounded(&self, postings: &[Vec<u32>]) -> bool {
        let Some(capacity) = self.config.counter_capacity else {
            return false;
        };
        match self.config.strategy {
            PairStrategy::Exact => false,
            PairStrategy::Bounded => true,
            PairStrategy::Auto => {
                let estimate: u128 = postings
                    .iter()
                    .map(|p| {
                        let n: usize = match self.config.max_tag_degree {
                            Some(max) if p.len() > max => match self.config.high_degree {
                                HighDegreePolicy::Sample => max,
                                HighDegreePolicy::Skip => 0,
                            },
                            _ => p.len(),
                        };
                        let n = n as u128;
                        n * n.saturating_sub(1) / 2
                    })
                    .sum();
                tracing::debug!(%estimate, capacity, "pair volume estimate");
                estimate > capacity as u128
            }
        }
    }

    /// Pass 2.
    fn count_pairs(
        &self,
        scan: &Scan,
        postings: &[Vec<u32>],
        report: &mut BuildReport,
        progress: &dyn Progress,
    ) -> PairCounter {
        let mut counter = match self.config.counter_capacity {
            Some(capacity) if self.use_bounded(postings) => {
                PairCounter::bounded(capacity, self.config.eviction_fraction)
            }
            _ => PairCounter::unbounded(),
        };

        let mut order: Vec<usize> = (0..postings.len()).collect();
        order.sort_by(|&a, &b| scan.tag_names[a].cmp(&scan.tag_names[b]));

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let (mut sampled, mut skipped) = (0usize, 0usize);
        let total = order.len();

        for (done, tag) in order.into_iter().enumerate() {
            let posting = postings[tag].as_slice();
            let picked: Vec<u32>;
            let members = match self.config.max_tag_degree {
                Some(max) if posting.len() > max => match self.config.high_degree {
                    HighDegreePolicy::Sample => {
                        sampled += 1;
                        let mut sample: Vec<u32> = rand::seq::index::sample(&mut rng, posting.len(), max)
                            .into_iter()
                            .map(|i| posting[i])
                            .collect();
                        sample.sort_unstable();
                        picked = sample;
                        picked.as_slice()
                    }
                    HighDegreePolicy::Skip => {
                        skipped += 1;
                        continue;
                    }
                },
                _ => posting,
            };

            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    if let Some(key) = PairKey::new(a, b) {
                        counter.increment(key);
                    }
                }
            }
            progress.update(Phase::Pairs, done + 1, Some(total));
        }

        if let Some(max_tag_degree) = self.config.max_tag_degree {
            if sampled > 0 {
                report.warn(Warning::TagsSampled {
                    tags: sampled,
                    max_tag_degree,
                });
            }
            if skipped > 0 {
                report.warn(Warning::TagsSkipped {
                    tags: skipped,
                    max_tag_degree,
                });
            }
        }
        tracing::info!(
            unique_pairs = counter.len(),
            sampled_tags = sampled,
            skipped_tags = skipped,
            bounded = counter.is_bounded(),
            "pair generation complete"
        );
        counter
    }

    /// Pass 3.
    fn finalize(
        &self,
        entities: &[Entity],
        counter: PairCounter,
        report: &mut BuildReport,
        progress: &dyn Progress,
    ) -> Graph {
        let names: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let unweighted = self.config.unweighted;
        let clip = self.config.max_edge_weight;
        let total = counter.len();
        progress.update(Phase::Finalize, 0, Some(total));

        let selection = Finalizer::new(&self.config.limits, &names)
            .with_min_weight(self.config.effective_min_weight())
            .finalize(counter.into_counts(), |w| match (unweighted, clip) {
                (true, _) => 1,
                (false, Some(max)) => w.min(max),
                (false, None) => w,
            });

        let points: Vec<Point> = selection
            .nodes
            .iter()
            .map(|node| {
                let e = &entities[node.idx as usize];
                Point::new(e.id.clone(), e.label.clone())
                    .with_degree(node.degree)
                    .with_category(e.category.clone())
                    .with_first_seen(e.first_seen)
            })
            .collect();
        let links: Vec<Link> = selection
            .edges
            .iter()
            .map(|edge| {
                Link::new(
                    names[edge.source as usize].clone(),
                    names[edge.target as usize].clone(),
                    edge.weight,
                )
            })
            .collect();
        progress.update(Phase::Finalize, total, Some(total));

        report.pairs_over_threshold = selection.pairs_over_threshold;
        report.points = points.len();
        report.links = links.len();
        tracing::info!(points = report.points, links = report.links, "entity graph built");

        Graph::new(points, links)
    }
}

/// Keeps the `max` entities carrying the most distinct tags (ties by id).
fn cap_entities(entities: &mut Vec<Entity>, max: usize) {
    if entities.len() <= max {
        return;
    }
    entities.sort_by(|a, b| b.tags.len().cmp(&a.tags.len()).then_with(|| a.id.cmp(&b.id)));
    entities.truncate(max);
    tracing::debug!(kept = max, "entities capped by tag diversity");
}

/// Tag id -> ascending entity ids.
fn inverted_index(scan: &Scan) -> Vec<Vec<u32>> {
    let mut postings = vec![Vec::new(); scan.tag_names.len()];
    for (idx, entity) in scan.entities.iter().enumerate() {
        for &tag in &entity.tags {
            postings[tag as usize].push(idx as u32);
        }
    }
    postings
}
