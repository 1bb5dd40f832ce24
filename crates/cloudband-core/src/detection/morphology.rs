use std::collections::VecDeque;

use ndarray::Array2;

/// 4-neighborhood offsets (the cross structuring element without its center).
const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Fill holes: background regions not 4-connected to the raster border
/// become foreground.
pub fn fill_holes(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return mask.clone();
    }
    let mut outside = Array2::from_elem((h, w), false);
    let mut queue = VecDeque::new();

    let mut seed = |row: usize, col: usize, outside: &mut Array2<bool>| {
        if !mask[[row, col]] && !outside[[row, col]] {
            outside[[row, col]] = true;
            queue.push_back((row, col));
        }
    };
    for col in 0..w {
        seed(0, col, &mut outside);
        seed(h.saturating_sub(1), col, &mut outside);
    }
    for row in 0..h {
        seed(row, 0, &mut outside);
        seed(row, w.saturating_sub(1), &mut outside);
    }

    while let Some((row, col)) = queue.pop_front() {
        for (dr, dc) in CROSS {
            let Some((nr, nc)) = offset(row, col, dr, dc, h, w) else {
                continue;
            };
            if !mask[[nr, nc]] && !outside[[nr, nc]] {
                outside[[nr, nc]] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    outside.mapv(|o| !o)
}

/// Binary dilation with the 3x3 cross: a pixel becomes true if it or any of
/// its 4-neighbors is true. Out-of-bounds neighbors count as false.
pub fn dilate_cross(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = mask[[row, col]]
                || CROSS.iter().any(|&(dr, dc)| {
                    offset(row, col, dr, dc, h, w).is_some_and(|(nr, nc)| mask[[nr, nc]])
                });
        }
    }

    result
}

fn offset(
    row: usize,
    col: usize,
    dr: isize,
    dc: isize,
    h: usize,
    w: usize,
) -> Option<(usize, usize)> {
    let nr = row.checked_add_signed(dr)?;
    let nc = col.checked_add_signed(dc)?;
    (nr < h && nc < w).then_some((nr, nc))
}
