use super::types::{HierarchyNode, MessageRef};

/// Depth-first (parent, then children) traversal of a thread.
///
/// Top-level messages get depth 0 and every reply its parent's depth + 1.
/// Siblings keep the order the index reported them in, and each child's whole
/// subtree is emitted before the next sibling. The traversal uses an explicit
/// stack, so reply chains of any length are fine.
pub fn build_hierarchy(top_level: &[MessageRef]) -> Vec<HierarchyNode> {
    // Pushed in reverse so pops come out left to right
    let mut stack: Vec<(MessageRef, usize)> =
        top_level.iter().rev().map(|m| (m.clone(), 0)).collect();
    let mut nodes = Vec::new();

    while let Some((message, depth)) = stack.pop() {
        stack.extend(
            message
                .replies()
                .iter()
                .rev()
                .map(|reply| (reply.clone(), depth + 1)),
        );
        nodes.push(HierarchyNode { message, depth });
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::MessageData;

    fn msg(id: &str, replies: Vec<MessageRef>) -> MessageRef {
        let mut data = MessageData::new(id, format!("/mail/{}", id));
        data.replies = replies;
        data.build()
    }

    fn ids(nodes: &[HierarchyNode]) -> Vec<(&str, usize)> {
        nodes.iter().map(|n| (n.message.id(), n.depth)).collect()
    }

    #[test]
    fn test_parent_before_children_siblings_in_order() {
        // a
        // ├─ b
        // │  └─ c
        // └─ d
        // e
        let thread = vec![
            msg(
                "a",
                vec![msg("b", vec![msg("c", vec![])]), msg("d", vec![])],
            ),
            msg("e", vec![]),
        ];

        let nodes = build_hierarchy(&thread);
        assert_eq!(
            ids(&nodes),
            vec![("a", 0), ("b", 1), ("c", 2), ("d", 1), ("e", 0)]
        );
    }

    #[test]
    fn test_length_matches_message_count() {
        let thread = vec![msg(
            "root",
            (0..5)
                .map(|i| msg(&format!("r{}", i), vec![msg(&format!("rr{}", i), vec![])]))
                .collect(),
        )];
        assert_eq!(build_hierarchy(&thread).len(), 11);
    }

    #[test]
    fn test_depth_is_parent_plus_one() {
        let thread = vec![
            msg("a", vec![msg("b", vec![msg("c", vec![])])]),
            msg("x", vec![msg("y", vec![])]),
        ];
        let nodes = build_hierarchy(&thread);

        for (pos, node) in nodes.iter().enumerate() {
            for reply in node.message.replies() {
                let child = nodes
                    .iter()
                    .skip(pos + 1)
                    .find(|n| n.message.id() == reply.id())
                    .expect("reply emitted after its parent");
                assert_eq!(child.depth, node.depth + 1);
            }
        }
        assert!(nodes.iter().filter(|n| n.depth == 0).count() == 2);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut tail = msg("m999", vec![]);
        for i in (0..999).rev() {
            tail = msg(&format!("m{}", i), vec![tail]);
        }
        let nodes = build_hierarchy(std::slice::from_ref(&tail));
        assert_eq!(nodes.len(), 1000);
        assert_eq!(nodes.last().map(|n| n.depth), Some(999));
    }

    #[test]
    fn test_repeatable() {
        let thread = vec![msg("a", vec![msg("b", vec![]), msg("c", vec![])])];
        assert_eq!(ids(&build_hierarchy(&thread)), ids(&build_hierarchy(&thread)));
    }

    #[test]
    fn test_empty_thread() {
        assert!(build_hierarchy(&[]).is_empty());
    }
}
