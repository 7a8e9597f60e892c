// A search of a search scheme. The blocks of the query are matched in the order given by `order`, and
// after the i-th matched block, the number of errors spent so far must lie in [lower[i], upper[i]].
// The blocks of a search are always visited such that the matched part of the query stays connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Search {
    pub(crate) order: Vec<usize>,
    pub(crate) lower: Vec<u8>,
    pub(crate) upper: Vec<u8>,
}

impl Search {
    fn from_table(order: &[usize], lower: &[u8], upper: &[u8]) -> Self {
        Self {
            order: order.to_vec(),
            lower: lower.to_vec(),
            upper: upper.to_vec(),
        }
    }

    pub(crate) fn num_blocks(&self) -> usize {
        self.order.len()
    }

    // whether the i-th block of the search is matched by extending to the right
    pub(crate) fn directions(&self) -> Vec<bool> {
        (0..self.order.len())
            .map(|i| match i {
                0 => self.order.get(1).is_none_or(|&next| next > self.order[0]),
                _ => self.order[i] > self.order[i - 1],
            })
            .collect()
    }
}

// optimum search schemes (Kianfar et al.) for one and two errors
const ONE_ERROR: [([usize; 2], [u8; 2], [u8; 2]); 2] =
    [([0, 1], [0, 0], [0, 1]), ([1, 0], [0, 1], [0, 1])];

const TWO_ERRORS: [([usize; 4], [u8; 4], [u8; 4]); 3] = [
    ([0, 1, 2, 3], [0, 0, 1, 1], [0, 0, 2, 2]),
    ([2, 1, 0, 3], [0, 0, 0, 0], [0, 1, 1, 2]),
    ([3, 2, 1, 0], [0, 0, 0, 2], [0, 1, 2, 2]),
];

/// Returns the searches that together find every occurrence with at most `max_errors` errors.
///
/// Falls back to a single search over one block (plain backtracking) if no optimum scheme is known or
/// the query is too short to be split into the blocks of the scheme.
pub(crate) fn search_scheme(max_errors: u8, query_len: usize) -> Vec<Search> {
    let optimum: Vec<Search> = match max_errors {
        1 => ONE_ERROR
            .iter()
            .map(|(order, lower, upper)| Search::from_table(order, lower, upper))
            .collect(),
        2 => TWO_ERRORS
            .iter()
            .map(|(order, lower, upper)| Search::from_table(order, lower, upper))
            .collect(),
        _ => Vec::new(),
    };

    if optimum.first().is_some_and(|search| search.num_blocks() <= query_len) {
        optimum
    } else {
        vec![Search {
            order: vec![0],
            lower: vec![0],
            upper: vec![max_errors],
        }]
    }
}

/// Splits a query into `num_blocks` blocks of (almost) equal length, the first blocks being one longer.
///
/// Returns the `num_blocks + 1` block boundaries, block `b` covers `boundaries[b]..boundaries[b + 1]`.
pub(crate) fn block_boundaries(num_blocks: usize, query_len: usize) -> Vec<usize> {
    let base_len = query_len / num_blocks;
    let num_longer_blocks = query_len % num_blocks;

    let mut boundaries = Vec::with_capacity(num_blocks + 1);
    boundaries.push(0);

    for block in 0..num_blocks {
        let len = base_len + usize::from(block < num_longer_blocks);
        boundaries.push(boundaries[block] + len);
    }

    boundaries
}
