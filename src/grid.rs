use anyhow::Result;

/// Cell state of the forest-fire automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    #[default]
    Empty,
    Tree,
    Burning,
}

/// Site state of the percolation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Site {
    #[default]
    Unoccupied,
    Occupied,
}

/// 4-connectivity offsets as (d_row, d_col): down, up, right, left.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A fixed-size square lattice stored as one flat row-major buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T: Copy + PartialEq> Lattice<T> {
    /// Creates a `size x size` lattice with every cell set to `fill`.
    pub fn new(size: usize, fill: T) -> Result<Self> {
        if size == 0 {
            anyhow::bail!("Lattice size must be greater than 0.");
        }
        Ok(Self { size, cells: vec![fill; size * size] })
    }

    /// Creates a lattice by calling `f(row, col)` for each cell in row-major order.
    pub fn from_fn<F>(size: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        if size == 0 {
            anyhow::bail!("Lattice size must be greater than 0.");
        }
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                cells.push(f(row, col));
            }
        }
        Ok(Self { size, cells })
    }

    /// Builds a lattice from nested rows; every row must have `rows.len()` entries.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            anyhow::bail!("Lattice rows must form a square of side {}.", size);
        }
        Self::from_fn(size, |row, col| rows[row][col])
    }

    /// Side length of the lattice.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (`size * size`).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index of `(row, col)`, or `None` if it falls outside the lattice.
    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.size && col < self.size {
            Some(row * self.size + col)
        } else {
            None
        }
    }

    /// Inverse of [`Lattice::index`].
    #[inline(always)]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx / self.size, idx % self.size)
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Writes `value` at `(row, col)`. Returns false if the coordinate is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        match self.index(row, col) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Iterates `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, &value)| (idx / self.size, idx % self.size, value))
    }

    /// In-bounds 4-neighbours of `(row, col)`. Edges and corners simply yield fewer
    /// coordinates; there is no wraparound.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        let size = self.size;
        NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dr, dc)| {
            let nr = row.checked_add_signed(dr)?;
            let nc = col.checked_add_signed(dc)?;
            (nr < size && nc < size).then_some((nr, nc))
        })
    }

    /// Number of cells equal to `value`.
    pub fn count(&self, value: T) -> usize {
        self.cells.iter().filter(|&&c| c == value).count()
    }

    /// Overwrites this lattice with the contents of a lattice of the same size.
    pub fn copy_from(&mut self, other: &Lattice<T>) {
        debug_assert_eq!(self.size, other.size);
        self.cells.copy_from_slice(&other.cells);
    }

    /// Same-sized lattice with `f` applied to every cell.
    pub fn map<U, F>(&self, f: F) -> Lattice<U>
    where
        F: FnMut(T) -> U,
    {
        Lattice { size: self.size, cells: self.cells.iter().copied().map(f).collect() }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}
