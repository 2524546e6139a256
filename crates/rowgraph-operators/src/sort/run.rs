//! Run generation and k-way merge for the sort kernel.
//!
//! The buffer accumulates decorated records; when the spill threshold is
//! reached it is sorted and flushed as a JSONL segment. Segments are merged
//! on output through a min-heap and deleted when the merge is dropped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use rowgraph_core::key::{cmp_key_tuples, KeyPolicy};
use rowgraph_core::{Key, Record, Result, Value};
use rowgraph_io::JsonlReader;
use rowgraph_io::JsonlWriter;

use super::{KeyClasses, SortOptions, SortOrder};

static NEXT_SEGMENT: AtomicU64 = AtomicU64::new(0);

pub(crate) struct RunBuffer {
    key: Key,
    order: SortOrder,
    policy: KeyPolicy,
    options: SortOptions,
    entries: Vec<(Vec<Value>, Record)>,
    segments: Vec<Segment>,
    classes: KeyClasses,
}

impl RunBuffer {
    pub(crate) fn new(key: Key, order: SortOrder, policy: KeyPolicy, options: SortOptions) -> Self {
        let width = key.fields().len();
        Self {
            key,
            order,
            policy,
            options,
            entries: Vec::new(),
            segments: Vec::new(),
            classes: KeyClasses::new(width),
        }
    }

    /// Decorate and buffer one record; flush a run when the threshold hits.
    pub(crate) fn push(&mut self, record: Record) -> Result<()> {
        let tuple = self.key.extract(&record, self.policy)?;
        self.classes.check(&tuple)?;
        self.entries.push((tuple, record));
        if let Some(threshold) = self.options.spill_threshold {
            if self.entries.len() >= threshold {
                self.flush_run()?;
            }
        }
        Ok(())
    }

    fn sort_entries(&mut self) {
        let order = self.order;
        // Comparisons cannot fail here: KeyClasses validated every tuple.
        self.entries.sort_by(|(a, _), (b, _)| {
            let ord = cmp_key_tuples(a, b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
    }

    fn flush_run(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        self.sort_entries();

        fs::create_dir_all(&self.options.spill_dir)?;
        let name = format!(
            "sort-{}-{}.jsonl",
            std::process::id(),
            NEXT_SEGMENT.fetch_add(1, AtomicOrdering::Relaxed)
        );
        let path = self.options.spill_dir.join(name);
        let mut writer = JsonlWriter::to_path(&path)?;
        let segment = Segment { path };
        writer.write_all(self.entries.iter().map(|(_, record)| record))?;

        self.segments.push(segment);
        self.entries.clear();
        Ok(())
    }

    /// Finish buffering: either a plain in-memory drain or a k-way merge
    /// over the flushed runs.
    pub(crate) fn finish(mut self) -> Result<Drained> {
        if self.segments.is_empty() {
            self.sort_entries();
            let records: Vec<Record> = self.entries.into_iter().map(|(_, record)| record).collect();
            return Ok(Drained::Memory(records.into_iter()));
        }
        self.flush_run()?;
        let merge = RunMerge::open(
            std::mem::take(&mut self.segments),
            self.key.clone(),
            self.order,
            self.policy,
        )?;
        Ok(Drained::Merge(merge))
    }
}

pub(crate) enum Drained {
    Memory(std::vec::IntoIter<Record>),
    Merge(RunMerge),
}

impl Iterator for Drained {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Drained::Memory(records) => records.next().map(Ok),
            Drained::Merge(merge) => merge.next(),
        }
    }
}

/// One sorted run on disk; the file goes away with the segment.
struct Segment {
    path: PathBuf,
}

impl Drop for Segment {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub(crate) struct RunMerge {
    runs: Vec<RunReader>,
    heap: BinaryHeap<MergeEntry>,
    key: Key,
    order: SortOrder,
    policy: KeyPolicy,
    failed: bool,
}

struct RunReader {
    reader: JsonlReader<BufReader<File>>,
    _segment: Segment,
}

impl RunMerge {
    fn open(
        segments: Vec<Segment>,
        key: Key,
        order: SortOrder,
        policy: KeyPolicy,
    ) -> Result<Self> {
        let mut runs = Vec::with_capacity(segments.len());
        for segment in segments {
            let reader = JsonlReader::from_path(&segment.path)?;
            runs.push(RunReader {
                reader,
                _segment: segment,
            });
        }

        let mut merge = Self {
            runs,
            heap: BinaryHeap::new(),
            key,
            order,
            policy,
            failed: false,
        };
        for run in 0..merge.runs.len() {
            merge.refill(run)?;
        }
        Ok(merge)
    }

    /// Read the next record of `run` (if any) into the heap.
    fn refill(&mut self, run: usize) -> Result<()> {
        match self.runs[run].reader.next() {
            Some(Ok(record)) => {
                let tuple = self.key.extract(&record, self.policy)?;
                self.heap.push(MergeEntry {
                    tuple,
                    record,
                    run,
                    order: self.order,
                });
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Ok(()),
        }
    }
}

impl Iterator for RunMerge {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let entry = self.heap.pop()?;
        if let Err(e) = self.refill(entry.run) {
            self.failed = true;
            return Some(Err(e));
        }
        Some(Ok(entry.record))
    }
}

/// Heap entry: min-heap over (key tuple, run index) so equal keys replay in
/// run order, which is input order.
struct MergeEntry {
    tuple: Vec<Value>,
    record: Record,
    run: usize,
    order: SortOrder,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Tuples were class-validated during run generation.
        let ord = cmp_key_tuples(&self.tuple, &other.tuple).unwrap_or(Ordering::Equal);
        let ord = match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        // Reverse for min-heap behavior on BinaryHeap.
        ord.then_with(|| self.run.cmp(&other.run)).reverse()
    }
}
