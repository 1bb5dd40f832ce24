use ndarray::Array2;

/// Pixel statistics for a single labelled component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentStats {
    /// Label of this component in the label raster.
    pub label: u32,
    /// Number of pixels in the component.
    pub pixels: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

/// Disjoint sets over labels `0..n`. Unions always keep the smaller root, so
/// the representative of a set is its minimum label.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
        }
    }

    /// Add a new singleton and return its label.
    pub fn push(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    pub fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[big as usize] = small;
        }
    }
}

/// Connected-component labelling with 8-connectivity, background = 0.
///
/// Two-pass union-find. Labels are numbered 1..=n in raster order of each
/// component's first pixel, so the result is fully determined by the mask.
pub fn label_components(mask: &Array2<bool>) -> Array2<u32> {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    if h == 0 || w == 0 {
        return labels;
    }

    // Index 0 is the background and never takes part in a union.
    let mut sets = UnionFind::new(1);

    // Pass 1: provisional labels from the already-visited neighbors
    // (left, upper-left, up, upper-right).
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }
            let mut current = 0u32;
            let visit = |r: usize, c: usize, current: &mut u32, sets: &mut UnionFind| {
                let neighbor = labels[[r, c]];
                if neighbor == 0 {
                    return;
                }
                if *current == 0 {
                    *current = neighbor;
                } else if *current != neighbor {
                    sets.union(*current, neighbor);
                    *current = (*current).min(neighbor);
                }
            };
            if col > 0 {
                visit(row, col - 1, &mut current, &mut sets);
            }
            if row > 0 {
                if col > 0 {
                    visit(row - 1, col - 1, &mut current, &mut sets);
                }
                visit(row - 1, col, &mut current, &mut sets);
                if col + 1 < w {
                    visit(row - 1, col + 1, &mut current, &mut sets);
                }
            }
            if current == 0 {
                current = sets.push();
            }
            labels[[row, col]] = current;
        }
    }

    // Pass 2: resolve roots and renumber sequentially in raster order.
    let mut final_label = vec![0u32; sets.parent.len()];
    let mut next = 1u32;
    for lbl in labels.iter_mut() {
        if *lbl == 0 {
            continue;
        }
        let root = sets.find(*lbl) as usize;
        if final_label[root] == 0 {
            final_label[root] = next;
            next += 1;
        }
        *lbl = final_label[root];
    }

    labels
}

/// Merge labels that touch through the left/right raster edges.
///
/// For every row whose first and last columns carry two different labels,
/// the two labels are unified into the smaller one. Labels are then
/// renumbered to 1..=n with no gaps, preserving their relative order.
pub fn connect_longitudes(labels: &Array2<u32>) -> Array2<u32> {
    let (h, w) = labels.dim();
    if h == 0 || w == 0 {
        return labels.clone();
    }
    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sets = UnionFind::new(max_label + 1);

    for row in 0..h {
        let first = labels[[row, 0]];
        let last = labels[[row, w - 1]];
        if first != 0 && last != 0 && first != last {
            sets.union(first, last);
        }
    }

    let mut merged = labels.mapv(|l| if l == 0 { 0 } else { sets.find(l) });
    renumber_labels(&mut merged);
    merged
}

/// Renumber labels in place to 1..=n with no gaps, keeping their order.
pub fn renumber_labels(labels: &mut Array2<u32>) {
    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut used = vec![false; max_label + 1];
    for &l in labels.iter() {
        used[l as usize] = true;
    }
    let mut mapping = vec![0u32; max_label + 1];
    let mut next = 1u32;
    for (old, &is_used) in used.iter().enumerate().skip(1) {
        if is_used {
            mapping[old] = next;
            next += 1;
        }
    }
    labels.mapv_inplace(|l| mapping[l as usize]);
}

/// Per-label pixel counts and bounding boxes, sorted by ascending label.
pub fn component_stats(labels: &Array2<u32>) -> Vec<ComponentStats> {
    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut stats: Vec<Option<ComponentStats>> = vec![None; max_label + 1];

    for ((row, col), &lbl) in labels.indexed_iter() {
        if lbl == 0 {
            continue;
        }
        let entry = stats[lbl as usize].get_or_insert(ComponentStats {
            label: lbl,
            pixels: 0,
            bbox: (row, row, col, col),
        });
        entry.pixels += 1;
        entry.bbox.0 = entry.bbox.0.min(row);
        entry.bbox.1 = entry.bbox.1.max(row);
        entry.bbox.2 = entry.bbox.2.min(col);
        entry.bbox.3 = entry.bbox.3.max(col);
    }

    stats.into_iter().flatten().collect()
}
