// Streaming tag co-occurrence accumulator
use crate::config::{CooccurrenceConfig, GraphLimits};
use crate::finalize::Finalizer;
use crate::normalize::{Identity, Labeler};
use crate::pair::PairKey;
use crate::progress::{NoProgress, Phase, Progress};
use crate::record::{RecordSource, SourceStats, TaggedRecord};
use crate::report::{BuildOutput, BuildReport};
use crate::{Graph, Link, Point, Result, Warning};
use ahash::AHashMap;
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorStats {
    pub rows_seen: usize,
    pub rows_with_tags: usize,
    pub rows_with_pairs: usize,
    pub rows_skipped: usize,
    pub unique_pairs: usize,
    pub unique_tags: usize,
}

#[derive(Debug, Clone)]
struct TagMeta {
    label: String,
    category: Option<String>,
    first_seen: Option<i64>,
    /// Sum of the counts of every pair touching this tag.
    degree: u64,
}

#[derive(Debug, Clone, Copy)]
struct PairStat {
    count: u32,
    first_seen: Option<i64>,
}

/// Counts how often each pair of tags appears together.
///
/// Feed it one record at a time with [`add`](Self::add), then call
/// [`build`](Self::build) as often as needed; building never consumes or
/// alters the accumulated counts.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceBuilder {
    config: CooccurrenceConfig,
    index: AHashMap<String, u32>,
    names: Vec<String>,
    tags: Vec<TagMeta>,
    pairs: AHashMap<PairKey, PairStat>,
    stats: AccumulatorStats,
}

#[inline]
fn min_ts(prev: Option<i64>, ts: Option<i64>) -> Option<i64> {
    match (prev, ts) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl CooccurrenceBuilder {
    pub fn new(config: CooccurrenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &CooccurrenceConfig {
        &self.config
    }

    /// Adds one observation with identity labels.
    pub fn add<S: AsRef<str>>(&mut self, tags: &[S], timestamp: Option<i64>) {
        self.add_with(tags, timestamp, &Identity);
    }

    /// Adds one observation; `labeler` resolves label and category the first
    /// time a tag is seen.
    pub fn add_with<S: AsRef<str>>(&mut self, tags: &[S], timestamp: Option<i64>, labeler: &dyn Labeler) {
        self.stats.rows_seen += 1;

        let mut ids: SmallVec<[u32; 16]> = SmallVec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            ids.push(self.intern(tag, labeler));
        }
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            self.stats.rows_skipped += 1;
            return;
        }
        self.stats.rows_with_tags += 1;

        for &id in &ids {
            let meta = &mut self.tags[id as usize];
            meta.first_seen = min_ts(meta.first_seen, timestamp);
        }

        if ids.len() < 2 {
            return;
        }
        self.stats.rows_with_pairs += 1;

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let Some(key) = PairKey::new(a, b) else { continue };
                let stat = self.pairs.entry(key).or_insert(PairStat {
                    count: 0,
                    first_seen: None,
                });
                stat.count = stat.count.saturating_add(1);
                stat.first_seen = min_ts(stat.first_seen, timestamp);
                self.tags[a as usize].degree += 1;
                self.tags[b as usize].degree += 1;
            }
        }
    }

    pub fn add_record(&mut self, record: &TaggedRecord, labeler: &dyn Labeler) {
        self.add_with(record.tags.as_slice(), record.timestamp, labeler);
    }

    /// Feeds every record of `source`.
    pub fn extend_from<S: RecordSource + ?Sized>(
        &mut self,
        source: &S,
        labeler: &dyn Labeler,
        progress: &dyn Progress,
    ) -> Result<SourceStats> {
        let mut done = 0usize;
        let stats = source.scan(&mut |record| {
            self.add_record(record, labeler);
            done += 1;
            progress.update(Phase::Scan, done, None);
        })?;
        self.stats.rows_seen += stats.rows_malformed;
        self.stats.rows_skipped += stats.rows_malformed;
        tracing::debug!(
            rows = stats.rows_read,
            malformed = stats.rows_malformed,
            tags = self.names.len(),
            pairs = self.pairs.len(),
            "co-occurrence scan complete"
        );
        Ok(stats)
    }

    fn intern(&mut self, tag: &str, labeler: &dyn Labeler) -> u32 {
        if let Some(&id) = self.index.get(tag) {
            return id;
        }
        let id = self.names.len() as u32;
        self.index.insert(tag.to_string(), id);
        self.names.push(tag.to_string());
        self.tags.push(TagMeta {
            label: labeler.label(tag),
            category: labeler.category(tag),
            first_seen: None,
            degree: 0,
        });
        id
    }

    /// Weighted degree recorded for `tag`: the sum of all its pair counts.
    pub fn weighted_degree(&self, tag: &str) -> Option<u64> {
        self.index.get(tag).map(|&id| self.tags[id as usize].degree)
    }

    /// Raw co-occurrence count of two tags, before any threshold.
    pub fn pair_count(&self, a: &str, b: &str) -> Option<u32> {
        let (a, b) = (*self.index.get(a)?, *self.index.get(b)?);
        self.pairs.get(&PairKey::new(a, b)?).map(|s| s.count)
    }

    /// Iterates `(tag, tag, count)` for every pair seen so far.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, u32)> {
        self.pairs.iter().map(|(key, stat)| {
            (
                self.names[key.low() as usize].as_str(),
                self.names[key.high() as usize].as_str(),
                stat.count,
            )
        })
    }

    pub fn stats(&self) -> AccumulatorStats {
        AccumulatorStats {
            unique_pairs: self.pairs.len(),
            unique_tags: self.names.len(),
            ..self.stats
        }
    }

    /// Clears all accumulated state, keeping the configuration.
    pub fn reset(&mut self) {
        self.index.clear();
        self.names.clear();
        self.tags.clear();
        self.pairs.clear();
        self.stats = AccumulatorStats::default();
    }

    /// Builds with the configured limits.
    pub fn build(&self) -> BuildOutput {
        self.build_with(&self.config.limits, &NoProgress)
    }

    /// Thresholds, ranks and caps the accumulated pairs into a graph.
    pub fn build_with(&self, limits: &GraphLimits, progress: &dyn Progress) -> BuildOutput {
        progress.update(Phase::Finalize, 0, Some(self.pairs.len()));
        let selection = Finalizer::new(limits, &self.names)
            .finalize(self.pairs.iter().map(|(&key, stat)| (key, stat.count)), |w| w);

        let points: Vec<Point> = selection
            .nodes
            .iter()
            .map(|node| {
                let meta = &self.tags[node.idx as usize];
                Point::new(self.names[node.idx as usize].clone(), meta.label.clone())
                    .with_degree(node.degree)
                    .with_category(meta.category.clone())
                    .with_first_seen(meta.first_seen)
            })
            .collect();

        let links: Vec<Link> = selection
            .edges
            .iter()
            .map(|edge| {
                let first_seen = self.pairs.get(&edge.key).and_then(|s| s.first_seen);
                Link::new(
                    self.names[edge.source as usize].clone(),
                    self.names[edge.target as usize].clone(),
                    edge.weight,
                )
                .with_first_seen(first_seen)
            })
            .collect();
        progress.update(Phase::Finalize, self.pairs.len(), Some(self.pairs.len()));

        let mut report = BuildReport {
            rows_seen: self.stats.rows_seen,
            rows_skipped: self.stats.rows_skipped,
            unique_pairs: self.pairs.len(),
            pairs_over_threshold: selection.pairs_over_threshold,
            points: points.len(),
            links: links.len(),
            bounded: false,
            warnings: Vec::new(),
        };
        if self.stats.rows_skipped > 0 {
            report.warn(Warning::InvalidInput {
                skipped: self.stats.rows_skipped,
            });
        }
        tracing::info!(
            points = report.points,
            links = report.links,
            unique_pairs = report.unique_pairs,
            "co-occurrence graph built"
        );

        BuildOutput {
            graph: Graph::new(points, links),
            report,
        }
    }
}
