//! Pass scheduling.
//!
//! The scheduler orders the frame's pass queue and partitions it into four
//! coarse execution blocks. Ordering is a *stable* sort by pass event: two
//! passes with equal events execute in the order their contributors
//! enqueued them, which is what makes feature composition deterministic.
//!
//! The blocks exist to insert fixed synchronization points (camera setup)
//! between groups:
//!
//! | Block | Events | Content |
//! |-------|--------|---------|
//! | `BeforeRendering` | `< BeforePrepasses` | shadow maps and other inputs; camera state not bound |
//! | `MainOpaque` | `[BeforePrepasses, AfterOpaques)` | prepasses and opaque geometry |
//! | `MainTransparent` | `[AfterOpaques, AfterPostProcess)` | skybox, transparents, post-processing |
//! | `AfterRendering` | `>= AfterPostProcess` | UI and overlays |

use std::ops::Range;

use crate::pass::{RenderPass, RenderPassEvent};

/// Number of execution blocks in a camera.
pub const RENDER_BLOCK_COUNT: usize = 4;

/// Coarse execution block of a camera's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum RenderBlock {
    /// Inputs to the main rendering that don't depend on camera state.
    BeforeRendering = 0,
    /// Main opaque rendering; camera state is bound.
    MainOpaque = 1,
    /// Transparents and post-processing.
    MainTransparent = 2,
    /// After post-processing.
    AfterRendering = 3,
}

impl RenderBlock {
    /// All blocks in execution order.
    pub const ALL: [RenderBlock; RENDER_BLOCK_COUNT] = [
        RenderBlock::BeforeRendering,
        RenderBlock::MainOpaque,
        RenderBlock::MainTransparent,
        RenderBlock::AfterRendering,
    ];

    /// Block name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            RenderBlock::BeforeRendering => "before_rendering",
            RenderBlock::MainOpaque => "main_opaque",
            RenderBlock::MainTransparent => "main_transparent",
            RenderBlock::AfterRendering => "after_rendering",
        }
    }
}

/// Upper event limits for the first three blocks; the last block is
/// unbounded.
const BLOCK_EVENT_LIMITS: [RenderPassEvent; RENDER_BLOCK_COUNT - 1] = [
    RenderPassEvent::BeforePrepasses,
    RenderPassEvent::AfterOpaques,
    RenderPassEvent::AfterPostProcess,
];

/// Stable-sort the pass queue by event.
///
/// Insertion sort: pass counts are small (tens), and stability is the
/// contract that matters — equal events keep their enqueue order.
pub fn sort_stable(queue: &mut [Box<dyn RenderPass>]) {
    for i in 1..queue.len() {
        let mut j = i;
        while j > 0 && queue[j].event() < queue[j - 1].event() {
            queue.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Contiguous index ranges partitioning a sorted pass queue into blocks.
///
/// The partition is exhaustive and non-overlapping: concatenating the four
/// ranges yields exactly `0..queue.len()`. Blocks may be empty; callers
/// skip empty blocks entirely so no binder call or profiling scope is
/// issued for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBlocks {
    ranges: [usize; RENDER_BLOCK_COUNT + 1],
}

impl RenderBlocks {
    /// Partition a queue already sorted by [`sort_stable`].
    pub fn new(queue: &[Box<dyn RenderPass>]) -> Self {
        let mut ranges = [0usize; RENDER_BLOCK_COUNT + 1];
        let mut current = 0;

        for (i, limit) in BLOCK_EVENT_LIMITS.iter().enumerate() {
            while current < queue.len() && queue[current].event() < *limit {
                current += 1;
            }
            ranges[i + 1] = current;
        }
        ranges[RENDER_BLOCK_COUNT] = queue.len();

        Self { ranges }
    }

    /// Index range of a block in the sorted queue.
    #[inline]
    pub fn range(&self, block: RenderBlock) -> Range<usize> {
        self.ranges[block as usize]..self.ranges[block as usize + 1]
    }

    /// Number of passes in a block.
    #[inline]
    pub fn len(&self, block: RenderBlock) -> usize {
        self.ranges[block as usize + 1] - self.ranges[block as usize]
    }

    /// True when a block holds no passes.
    #[inline]
    pub fn is_empty(&self, block: RenderBlock) -> bool {
        self.len(block) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RenderBackend;
    use crate::pass::PassAttachments;
    use crate::pipeline::RenderingData;

    struct TestPass {
        id: &'static str,
        event: RenderPassEvent,
        attachments: PassAttachments,
    }

    impl TestPass {
        fn boxed(id: &'static str, event: RenderPassEvent) -> Box<dyn RenderPass> {
            Box::new(Self {
                id,
                event,
                attachments: PassAttachments::default(),
            })
        }
    }

    impl RenderPass for TestPass {
        fn name(&self) -> &str {
            self.id
        }

        fn event(&self) -> RenderPassEvent {
            self.event
        }

        fn attachments(&self) -> &PassAttachments {
            &self.attachments
        }

        fn execute(&self, _backend: &mut dyn RenderBackend, _data: &RenderingData) {}
    }

    fn names(queue: &[Box<dyn RenderPass>]) -> Vec<&str> {
        queue.iter().map(|p| p.name()).collect()
    }

    #[test]
    fn sort_is_stable_for_equal_events() {
        // Two passes with equal events keep their enqueue order; the lower
        // event moves ahead of both.
        let mut queue = vec![
            TestPass::boxed("a", RenderPassEvent::BeforeTransparents),
            TestPass::boxed("b", RenderPassEvent::BeforeTransparents),
            TestPass::boxed("c", RenderPassEvent::BeforeOpaques),
        ];
        sort_stable(&mut queue);
        assert_eq!(names(&queue), vec!["c", "a", "b"]);
    }

    #[test]
    fn sort_stable_many_ties() {
        let mut queue = vec![
            TestPass::boxed("t1", RenderPassEvent::AfterRendering),
            TestPass::boxed("o1", RenderPassEvent::BeforeOpaques),
            TestPass::boxed("t2", RenderPassEvent::AfterRendering),
            TestPass::boxed("s1", RenderPassEvent::BeforeShadows),
            TestPass::boxed("o2", RenderPassEvent::BeforeOpaques),
            TestPass::boxed("t3", RenderPassEvent::AfterRendering),
        ];
        sort_stable(&mut queue);
        assert_eq!(names(&queue), vec!["s1", "o1", "o2", "t1", "t2", "t3"]);
    }

    #[test]
    fn partition_is_exhaustive_and_non_overlapping() {
        let mut queue = vec![
            TestPass::boxed("ui", RenderPassEvent::AfterRendering),
            TestPass::boxed("shadow", RenderPassEvent::BeforeShadows),
            TestPass::boxed("transparent", RenderPassEvent::BeforeTransparents),
            TestPass::boxed("opaque", RenderPassEvent::BeforeOpaques),
            TestPass::boxed("prepass", RenderPassEvent::BeforePrepasses),
        ];
        sort_stable(&mut queue);
        let blocks = RenderBlocks::new(&queue);

        let mut covered = 0;
        for block in RenderBlock::ALL {
            let range = blocks.range(block);
            assert_eq!(range.start, covered);
            covered = range.end;
        }
        assert_eq!(covered, queue.len());

        assert_eq!(blocks.len(RenderBlock::BeforeRendering), 1);
        assert_eq!(blocks.len(RenderBlock::MainOpaque), 2);
        assert_eq!(blocks.len(RenderBlock::MainTransparent), 1);
        assert_eq!(blocks.len(RenderBlock::AfterRendering), 1);
    }

    #[test]
    fn partition_of_empty_queue() {
        let queue: Vec<Box<dyn RenderPass>> = Vec::new();
        let blocks = RenderBlocks::new(&queue);
        for block in RenderBlock::ALL {
            assert!(blocks.is_empty(block));
            assert_eq!(blocks.range(block), 0..0);
        }
    }

    #[test]
    fn boundary_events_land_in_later_block() {
        // An event equal to a block limit belongs to the next block.
        let mut queue = vec![
            TestPass::boxed("at_prepass", RenderPassEvent::BeforePrepasses),
            TestPass::boxed("at_after_opaques", RenderPassEvent::AfterOpaques),
            TestPass::boxed("at_after_post", RenderPassEvent::AfterPostProcess),
        ];
        sort_stable(&mut queue);
        let blocks = RenderBlocks::new(&queue);

        assert_eq!(blocks.len(RenderBlock::BeforeRendering), 0);
        assert_eq!(blocks.range(RenderBlock::MainOpaque), 0..1);
        assert_eq!(blocks.range(RenderBlock::MainTransparent), 1..2);
        assert_eq!(blocks.range(RenderBlock::AfterRendering), 2..3);
    }

    #[test]
    fn single_block_queue() {
        let queue = vec![
            TestPass::boxed("o1", RenderPassEvent::BeforeOpaques),
            TestPass::boxed("o2", RenderPassEvent::AfterPrepasses),
        ];
        let blocks = RenderBlocks::new(&queue);
        assert_eq!(blocks.len(RenderBlock::MainOpaque), 2);
        assert!(blocks.is_empty(RenderBlock::BeforeRendering));
        assert!(blocks.is_empty(RenderBlock::MainTransparent));
        assert!(blocks.is_empty(RenderBlock::AfterRendering));
    }
}
