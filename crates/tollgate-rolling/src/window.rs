use std::fmt;

/// One time slice of a [`Window`].
///
/// `count` is the number of observations recorded in the slice; `points`
/// holds their values, either one running sum or one entry per observation
/// depending on how the bucket was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    points: Vec<f64>,
    count: i64,
}

impl Bucket {
    /// Records `val` as a new point.
    pub fn append(&mut self, val: f64) {
        self.points.push(val);
        self.count += 1;
    }

    /// Adds `val` onto the point at `offset`, appending it if that point
    /// does not exist yet.
    pub fn add(&mut self, offset: usize, val: f64) {
        match self.points.get_mut(offset) {
            Some(point) => *point += val,
            None => self.points.push(val),
        }
        self.count += 1;
    }

    /// Clears the bucket.
    pub fn reset(&mut self) {
        self.points.clear();
        self.count = 0;
    }

    /// Observed values.
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Number of observations.
    pub fn count(&self) -> i64 {
        self.count
    }
}

/// A fixed-size ring of buckets.
///
/// Offsets wrap, so `bucket(size)` is `bucket(0)`.
#[derive(Clone, PartialEq)]
pub struct Window {
    buckets: Vec<Bucket>,
}

impl Window {
    /// Creates a window with `size` empty buckets. A size of zero is
    /// treated as one.
    pub fn new(size: usize) -> Self {
        Self {
            buckets: vec![Bucket::default(); size.max(1)],
        }
    }

    /// Clears every bucket.
    pub fn reset_window(&mut self) {
        for bucket in &mut self.buckets {
            bucket.reset();
        }
    }

    /// Clears the bucket at `offset`.
    pub fn reset_bucket(&mut self, offset: usize) {
        let idx = self.index(offset);
        self.buckets[idx].reset();
    }

    /// Clears each bucket listed in `offsets`.
    pub fn reset_buckets(&mut self, offsets: &[usize]) {
        for &offset in offsets {
            self.reset_bucket(offset);
        }
    }

    /// Appends `val` as a new point in the bucket at `offset`.
    pub fn append(&mut self, offset: usize, val: f64) {
        let idx = self.index(offset);
        self.buckets[idx].append(val);
    }

    /// Accumulates `val` into the bucket at `offset`.
    ///
    /// The first value written to an empty bucket becomes its only point;
    /// later values are summed into that point.
    pub fn add(&mut self, offset: usize, val: f64) {
        let idx = self.index(offset);
        let bucket = &mut self.buckets[idx];
        if bucket.count == 0 {
            bucket.append(val);
        } else {
            bucket.add(0, val);
        }
    }

    /// The bucket at `offset`.
    pub fn bucket(&self, offset: usize) -> &Bucket {
        &self.buckets[self.index(offset)]
    }

    /// Number of buckets.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Iterates `count` buckets starting at `offset`, wrapping around the
    /// ring. `count` may exceed `size`, in which case buckets repeat.
    pub fn iter(&self, offset: usize, count: usize) -> Iter<'_> {
        Iter {
            window: self,
            offset: self.index(offset),
            remaining: count,
        }
    }

    fn index(&self, offset: usize) -> usize {
        offset % self.buckets.len()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("size", &self.buckets.len())
            .field("buckets", &self.buckets)
            .finish()
    }
}

/// Iterator over a contiguous run of buckets. Created by [`Window::iter`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    window: &'a Window,
    offset: usize,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Bucket;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let bucket = &self.window.buckets[self.offset];
        self.offset = (self.offset + 1) % self.window.buckets.len();
        self.remaining -= 1;
        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
