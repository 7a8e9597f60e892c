// static binary search tree over the sentinel positions, heap-like memory layout in flat array
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone)]
pub(crate) struct TextIdSearchTree {
    nodes: Vec<Node>,
    sentinel_indices: Vec<usize>,
}

impl TextIdSearchTree {
    // indices must be sorted and non-empty
    pub(crate) fn new_from_sentinel_indices(sentinel_indices: Vec<usize>) -> Self {
        assert!(!sentinel_indices.is_empty());
        // required for the encoding of Node
        assert!(sentinel_indices.iter().all(|&i| i < isize::MAX as usize));

        let mut nodes = vec![Node::new_inner(0); sentinel_indices.len().next_power_of_two() * 2 - 1];
        let mut max_index_used = 0;

        add_nodes(&mut nodes, 0, &sentinel_indices, 0, &mut max_index_used);

        nodes.truncate(max_index_used + 1);
        nodes.shrink_to_fit();

        Self {
            nodes,
            sentinel_indices,
        }
    }

    pub(crate) fn num_texts(&self) -> usize {
        self.sentinel_indices.len()
    }

    pub(crate) fn text_start(&self, text_id: usize) -> usize {
        if text_id == 0 {
            0
        } else {
            self.sentinel_indices[text_id - 1] + 1
        }
    }

    pub(crate) fn text_len(&self, text_id: usize) -> usize {
        self.sentinel_indices[text_id] - self.text_start(text_id)
    }

    /// Splits a position of the concatenated text into `(text_id, offset)`.
    pub(crate) fn split_concatenated_text_index(&self, concatenated_text_index: usize) -> (usize, usize) {
        let text_id = self.lookup_text_id(concatenated_text_index);

        (text_id, concatenated_text_index - self.text_start(text_id))
    }

    // a sentinel belongs to the text before it
    fn lookup_text_id(&self, concatenated_text_index: usize) -> usize {
        let mut node_index = 0;

        while let Some(threshold) = self.nodes[node_index].threshold() {
            node_index = if concatenated_text_index <= threshold {
                node_index * 2 + 1
            } else {
                node_index * 2 + 2
            };
        }

        self.nodes[node_index].text_id()
    }
}

fn add_nodes(
    nodes: &mut [Node],
    node_index: usize,
    indices: &[usize],
    first_text_id: usize,
    max_index_used: &mut usize,
) {
    *max_index_used = (*max_index_used).max(node_index);

    if let [_] = indices {
        nodes[node_index] = Node::new_leaf(first_text_id);
        return;
    }

    // left subtree is always complete, which keeps the tree shallow
    let split = indices.len().next_power_of_two() / 2;
    let (left, right) = indices.split_at(split);

    nodes[node_index] = Node::new_inner(left[left.len() - 1]);

    add_nodes(nodes, node_index * 2 + 1, left, first_text_id, max_index_used);
    add_nodes(nodes, node_index * 2 + 2, right, first_text_id + split, max_index_used);
}

// inner nodes store a threshold as a non-negative value, leaves store the bit flipped (negative) text id
#[cfg_attr(feature = "savefile", derive(savefile::savefile_derive::Savefile))]
#[derive(Debug, Clone, Copy)]
struct Node {
    data: isize,
}

impl Node {
    fn new_inner(threshold: usize) -> Self {
        Self {
            data: threshold as isize,
        }
    }

    fn new_leaf(text_id: usize) -> Self {
        Self {
            data: !(text_id as isize),
        }
    }

    fn threshold(&self) -> Option<usize> {
        (self.data >= 0).then_some(self.data as usize)
    }

    fn text_id(&self) -> usize {
        (!self.data) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_text_lookup() {
        let sentinel_indices = vec![10, 21, 32, 50, 68, 140, 141];
        let text_ids = TextIdSearchTree::new_from_sentinel_indices(sentinel_indices);

        assert_eq!(0, text_ids.lookup_text_id(5));
        assert_eq!(1, text_ids.lookup_text_id(21));
        assert_eq!(0, text_ids.lookup_text_id(0));
        assert_eq!(5, text_ids.lookup_text_id(140));
        assert_eq!(6, text_ids.lookup_text_id(141));
        assert_eq!(3, text_ids.lookup_text_id(33));
        assert_eq!(4, text_ids.lookup_text_id(67));
    }

    #[test]
    fn split_and_lengths() {
        let text_ids = TextIdSearchTree::new_from_sentinel_indices(vec![3, 4, 9]);

        assert_eq!(text_ids.num_texts(), 3);
        assert_eq!(text_ids.split_concatenated_text_index(2), (0, 2));
        assert_eq!(text_ids.split_concatenated_text_index(5), (2, 0));
        assert_eq!(text_ids.split_concatenated_text_index(8), (2, 3));
        assert_eq!(
            (0..3).map(|id| text_ids.text_len(id)).collect::<Vec<_>>(),
            [3, 0, 4]
        );
    }

    #[test]
    fn single_text() {
        let text_ids = TextIdSearchTree::new_from_sentinel_indices(vec![7]);
        assert_eq!(text_ids.split_concatenated_text_index(6), (0, 6));
    }
}
