//! Content record to canonical source text

use super::fence::format_info;
use super::{BlockNode, CodeBlock, ContentRecord, FrontMatter};

/// Serialize a record so that parsing the output gives the same record back
pub fn write(record: &ContentRecord) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(&FrontMatter::from(record))?;

    let mut out = String::from("---\n");
    out.push_str(yaml.trim_start_matches("---\n"));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");

    let blocks: Vec<String> = record.body.iter().map(write_block).collect();
    if !blocks.is_empty() {
        out.push('\n');
        out.push_str(&blocks.join("\n\n"));
        out.push('\n');
    }

    Ok(out)
}

fn write_block(node: &BlockNode) -> String {
    match node {
        BlockNode::Paragraph { content } => content.clone(),
        BlockNode::Heading { level, text } => {
            let hashes = "#".repeat(*level as usize);
            // A closing sequence keeps a trailing `#` in the text
            if text.ends_with('#') {
                format!("{} {} #", hashes, text)
            } else {
                format!("{} {}", hashes, text)
            }
        }
        BlockNode::CodeBlock(block) => write_code_block(block),
        BlockNode::Component { widget } => widget.to_tag(),
    }
}

fn write_code_block(block: &CodeBlock) -> String {
    let info = format_info(block);
    // Backtick fences cannot carry a backtick in their info string
    let marker = if info.contains('`') { '~' } else { '`' };

    // Outrun any fence of the same kind inside the code itself
    let longest = block
        .source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            trimmed.len() - trimmed.trim_start_matches(marker).len()
        })
        .max()
        .unwrap_or(0);
    let fence = marker.to_string().repeat((longest + 1).max(3));

    let mut out = format!("{}{}\n", fence, info);
    if !block.source.is_empty() {
        out.push_str(&block.source);
        out.push('\n');
    }
    out.push_str(&fence);
    out
}
