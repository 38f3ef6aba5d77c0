use crate::types::{Block, BlockKind};

/// Coalesce adjacent finalized text blocks for display.
///
/// The merged block keeps the id and creation time of the first block of the
/// run. Every other block, and any block that is still streaming, passes
/// through unchanged.
pub fn merge(blocks: &[Block]) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());

    for block in blocks {
        if let Some(last) = merged.last_mut() {
            if is_mergeable(last) && is_mergeable(block) {
                last.content.push('\n');
                last.content.push_str(&block.content);
                continue;
            }
        }
        merged.push(block.clone());
    }

    merged
}

fn is_mergeable(block: &Block) -> bool {
    block.kind == BlockKind::Text && !block.is_streaming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockId, ExecutionStatus};

    fn finalized(id: u64, kind: BlockKind, content: &str) -> Block {
        Block::open(BlockId(id), kind, content).finalize()
    }

    #[test]
    fn test_adjacent_text_blocks_are_joined() {
        let blocks = vec![
            finalized(1, BlockKind::Text, "first"),
            finalized(2, BlockKind::Text, "second"),
            finalized(3, BlockKind::Text, "third"),
        ];
        let merged = merge(&blocks);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, BlockId(1));
        assert_eq!(merged[0].content, "first\nsecond\nthird");
        assert_eq!(merged[0].created_at, blocks[0].created_at);
    }

    #[test]
    fn test_other_kinds_separate_text_runs() {
        let call = Block::open(BlockId(2), BlockKind::ToolCall, "⏺ Read(a.rs)")
            .with_tool(Some("Read".into()), Some("a.rs".into()), ExecutionStatus::Success)
            .finalize();
        let blocks = vec![
            finalized(1, BlockKind::Text, "before"),
            call.clone(),
            finalized(3, BlockKind::Text, "after"),
            finalized(4, BlockKind::Status, "✻ Baked for 3s"),
            finalized(5, BlockKind::Status, "✻ Baked for 4s"),
        ];
        let merged = merge(&blocks);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged[1], call);
    }

    #[test]
    fn test_streaming_block_is_never_merged() {
        let blocks = vec![
            finalized(1, BlockKind::Text, "done"),
            Block::open(BlockId(2), BlockKind::Text, "still typing"),
        ];
        let merged = merge(&blocks);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].is_streaming);
        assert_eq!(merged[0].content, "done");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let blocks = vec![
            finalized(1, BlockKind::Text, "a"),
            finalized(2, BlockKind::Text, "b"),
            finalized(3, BlockKind::Thinking, "∴ Thinking…"),
            finalized(4, BlockKind::Text, "c"),
        ];
        let once = merge(&blocks);
        assert_eq!(merge(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(&[]).is_empty());
    }
}
