//! Common test utilities for the transcript parser tests

use crate::transcript::session::SessionParser;
use crate::types::{Block, BlockKind};

/// Split bytes into chunks of the given size, ignoring UTF-8 and escape
/// sequence boundaries
pub fn chunk_bytes(input: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    input.chunks(chunk_size.max(1)).collect()
}

/// Split bytes at the given offsets (out-of-range offsets are ignored)
pub fn split_at_offsets<'a>(input: &'a [u8], offsets: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = offsets
        .iter()
        .copied()
        .filter(|&offset| offset > 0 && offset < input.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(&input[start..cut]);
        start = cut;
    }
    pieces.push(&input[start..]);
    pieces
}

/// Feed text in chunks of the given size and finish the stream
pub fn parse_chunked(text: &str, chunk_size: usize) -> SessionParser {
    let mut parser = SessionParser::default();
    for chunk in chunk_bytes(text.as_bytes(), chunk_size) {
        parser.feed(chunk);
    }
    parser.finish();
    parser
}

/// Simplified view of a block for comparisons
pub fn summarize(blocks: &[Block]) -> Vec<(BlockKind, String)> {
    blocks
        .iter()
        .map(|block| (block.kind, block.content.clone()))
        .collect()
}

/// Helper function to print blocks for debugging
#[allow(dead_code)]
pub fn print_blocks(blocks: &[Block]) {
    println!("Collected {} blocks:", blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        println!(
            "  [{i}] {} {} {:?} {:?}: {:?}",
            block.id, block.kind, block.tool_name, block.execution_status, block.content
        );
    }
}

/// Assert that blocks match the expected kinds and contents
pub fn assert_blocks_match(expected: &[(BlockKind, &str)], actual: &[Block]) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "Different number of blocks. Expected {:?}, got {:?}",
        expected,
        summarize(actual)
    );

    for (i, ((kind, content), block)) in expected.iter().zip(actual.iter()).enumerate() {
        assert!(
            *kind == block.kind && *content == block.content,
            "Block mismatch at position {}: \nExpected: {:?} {:?}\nActual: {:?} {:?}",
            i,
            kind,
            content,
            block.kind,
            block.content
        );
    }
}
