//! Bounding Volume Hierarchy over a primitive list.
//!
//! The tree is a flat node array over a reordered index array, built top-down
//! with a bucketed surface area heuristic. Primitives without finite bounds
//! (planes) stay outside the tree and are tested on every query.

use ember_core::MeshGroup;
use ember_math::{Aabb, Ray, Vec3};

use crate::{Primitive, RenderError, RenderResult, Shape, ShaderParameter};

/// Candidate split planes per axis.
const SAH_BUCKETS: usize = 12;

/// Ranges this small always become a leaf.
const MIN_LEAF_SIZE: usize = 2;

/// Largest leaf accepted when no split improves the SAH cost.
const MAX_LEAF_SIZE: usize = 4;

/// Flat BVH node.
///
/// Using an enum rather than trait objects keeps nodes in a single `Vec`.
#[derive(Clone, Debug)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        start: usize,
        count: usize,
    },
    Interior {
        bounds: Aabb,
        left: usize,
        right: usize,
        axis: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Interior { bounds, .. } => bounds,
        }
    }
}

/// BVH over a snapshot of a primitive list.
///
/// The snapshot is taken by `build`; later changes to the source list are not
/// seen until the next build.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
    unbounded: Vec<usize>,
    primitives: Vec<Primitive>,
    bounds: Aabb,
}

impl Bvh {
    /// Create an empty, unbuilt BVH. Every query on it misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once `build` has succeeded.
    pub fn is_built(&self) -> bool {
        !self.primitives.is_empty()
    }

    /// Number of primitives in the snapshot.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Number of tree nodes (unbounded primitives are not in the tree).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Snapshot primitive at `index`, as returned by [`Bvh::closest_hit`].
    pub fn primitive(&self, index: usize) -> Option<&Primitive> {
        self.primitives.get(index)
    }

    /// Build the tree over `primitives`.
    ///
    /// Fails on an empty list and leaves the previous tree untouched.
    pub fn build(&mut self, primitives: &[Primitive]) -> RenderResult<()> {
        if primitives.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        let mut boxes = Vec::with_capacity(primitives.len());
        let mut centroids = Vec::with_capacity(primitives.len());
        let mut bounded = Vec::with_capacity(primitives.len());
        let mut unbounded = Vec::new();
        for (i, primitive) in primitives.iter().enumerate() {
            let bbox = primitive.bounding_box();
            if bbox.is_bounded() {
                bounded.push(i);
            } else {
                unbounded.push(i);
            }
            centroids.push(bbox.centroid());
            boxes.push(bbox);
        }

        let mut builder = BvhBuilder {
            boxes: &boxes,
            centroids: &centroids,
            indices: bounded,
            nodes: Vec::with_capacity(2 * primitives.len()),
        };
        let bounded_count = builder.indices.len();
        if bounded_count > 0 {
            builder.build_range(0, bounded_count);
        }

        let bounds = boxes
            .iter()
            .filter(|b| !b.is_empty())
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, b));

        self.nodes = builder.nodes;
        self.indices = builder.indices;
        self.unbounded = unbounded;
        self.primitives = primitives.to_vec();
        self.bounds = bounds;

        log::info!(
            "BVH built: {} primitives ({} unbounded), {} nodes",
            self.primitives.len(),
            self.unbounded.len(),
            self.nodes.len()
        );
        Ok(())
    }

    /// Nearest hit. Returns the snapshot index of the primitive that was hit
    /// and fills `param`; `param` is untouched on a miss.
    pub fn closest_hit(
        &self,
        ray: &Ray,
        meshes: &[MeshGroup],
        param: &mut ShaderParameter,
    ) -> Option<usize> {
        let mut ray = *ray;
        let mut closest = None;

        for &i in &self.unbounded {
            if self.primitives[i].intersects_with(&ray, meshes, param) {
                ray.set_tmax(param.distance);
                closest = Some(i);
            }
        }

        if self.nodes.is_empty() {
            return closest;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            // tmax shrinks with every hit, which prunes boxes entered beyond it
            if !node.bounds().hit(&ray) {
                continue;
            }
            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    for &i in &self.indices[start..start + count] {
                        if self.primitives[i].intersects_with(&ray, meshes, param) {
                            ray.set_tmax(param.distance);
                            closest = Some(i);
                        }
                    }
                }
                BvhNode::Interior {
                    left, right, axis, ..
                } => {
                    // Push the far child first so the near one is visited first
                    if ray.direction[axis] < 0.0 {
                        stack.push(left);
                        stack.push(right);
                    } else {
                        stack.push(right);
                        stack.push(left);
                    }
                }
            }
        }

        closest
    }

    /// Any hit. Returns on the first primitive that reports one.
    pub fn any_hit(&self, ray: &Ray, meshes: &[MeshGroup]) -> bool {
        if self
            .unbounded
            .iter()
            .any(|&i| self.primitives[i].intersects(ray, meshes))
        {
            return true;
        }
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds().hit(ray) {
                continue;
            }
            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    if self.indices[start..start + count]
                        .iter()
                        .any(|&i| self.primitives[i].intersects(ray, meshes))
                    {
                        return true;
                    }
                }
                BvhNode::Interior { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        false
    }
}

impl Shape for Bvh {
    fn intersects(&self, ray: &Ray, meshes: &[MeshGroup]) -> bool {
        self.bounds.hit(ray) && self.any_hit(ray, meshes)
    }

    fn intersects_with(
        &self,
        ray: &Ray,
        meshes: &[MeshGroup],
        param: &mut ShaderParameter,
    ) -> bool {
        self.bounds.hit(ray) && self.closest_hit(ray, meshes, param).is_some()
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }

    /// Refresh the snapshot's cached boxes and rebuild.
    fn update_box(&mut self, meshes: &[MeshGroup]) {
        if !self.is_built() {
            return;
        }
        let mut primitives = std::mem::take(&mut self.primitives);
        for primitive in &mut primitives {
            primitive.update_box(meshes);
        }
        // Non-empty, so build cannot fail
        if let Err(err) = self.build(&primitives) {
            log::warn!("BVH rebuild failed: {}", err);
        }
    }
}

/// Top-down builder state.
struct BvhBuilder<'a> {
    boxes: &'a [Aabb],
    centroids: &'a [Vec3],
    indices: Vec<usize>,
    nodes: Vec<BvhNode>,
}

impl BvhBuilder<'_> {
    /// Build the subtree over `indices[start..end]` and return its node index.
    fn build_range(&mut self, start: usize, end: usize) -> usize {
        let (bounds, centroid_bounds) = self.compute_bounds(start, end);
        let count = end - start;
        if count <= MIN_LEAF_SIZE {
            return self.push_leaf(bounds, start, count);
        }

        let axis = centroid_bounds.longest_axis();
        let extent = centroid_bounds.axis_interval(axis);

        let mid = if extent.size() <= f32::EPSILON * extent.min.abs().max(1.0) {
            // All centroids coincide on every axis; SAH has nothing to work with
            if count <= MAX_LEAF_SIZE {
                return self.push_leaf(bounds, start, count);
            }
            self.split_median(start, end, axis)
        } else {
            match self.split_sah(start, end, axis, &bounds, extent.min, extent.size()) {
                Some(mid) => mid,
                None if count <= MAX_LEAF_SIZE => return self.push_leaf(bounds, start, count),
                None => self.split_median(start, end, axis),
            }
        };

        // Reserve the parent slot, then fill it once both children exist
        let node_idx = self.push_leaf(bounds, start, 0);
        let left = self.build_range(start, mid);
        let right = self.build_range(mid, end);
        self.nodes[node_idx] = BvhNode::Interior {
            bounds,
            left,
            right,
            axis,
        };
        node_idx
    }

    /// Partition by the cheapest of the bucket boundaries.
    ///
    /// Returns `None` when no split beats keeping the range as one leaf or the
    /// partition would leave a side empty.
    fn split_sah(
        &mut self,
        start: usize,
        end: usize,
        axis: usize,
        bounds: &Aabb,
        axis_min: f32,
        axis_extent: f32,
    ) -> Option<usize> {
        let bucket_of = |c: Vec3| -> usize {
            let b = ((c[axis] - axis_min) / axis_extent * SAH_BUCKETS as f32) as usize;
            b.min(SAH_BUCKETS - 1)
        };

        let mut buckets = [(0usize, Aabb::EMPTY); SAH_BUCKETS];
        for &idx in &self.indices[start..end] {
            let b = bucket_of(self.centroids[idx]);
            buckets[b].0 += 1;
            buckets[b].1 = Aabb::surrounding(&buckets[b].1, &self.boxes[idx]);
        }

        let parent_area = bounds.surface_area().max(f32::EPSILON);
        let mut best: Option<(usize, f32)> = None;
        for split in 0..SAH_BUCKETS - 1 {
            let (mut left_count, mut left_box) = (0usize, Aabb::EMPTY);
            let (mut right_count, mut right_box) = (0usize, Aabb::EMPTY);
            for (count, bbox) in &buckets[..=split] {
                left_count += count;
                left_box = Aabb::surrounding(&left_box, bbox);
            }
            for (count, bbox) in &buckets[split + 1..] {
                right_count += count;
                right_box = Aabb::surrounding(&right_box, bbox);
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }
            let cost = 1.0
                + (left_count as f32 * left_box.surface_area()
                    + right_count as f32 * right_box.surface_area())
                    / parent_area;
            if best.map_or(true, |(_, c)| cost < c) {
                best = Some((split, cost));
            }
        }

        let (split, cost) = best?;
        if cost >= (end - start) as f32 {
            return None;
        }

        let centroids = self.centroids;
        let slice = &mut self.indices[start..end];
        let mut mid = 0;
        for i in 0..slice.len() {
            if bucket_of(centroids[slice[i]]) <= split {
                slice.swap(i, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == slice.len() {
            return None;
        }
        Some(start + mid)
    }

    /// Split at the median centroid along `axis`.
    fn split_median(&mut self, start: usize, end: usize, axis: usize) -> usize {
        let mid = (start + end) / 2;
        let centroids = self.centroids;
        self.indices[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            centroids[a][axis].total_cmp(&centroids[b][axis])
        });
        mid
    }

    fn push_leaf(&mut self, bounds: Aabb, start: usize, count: usize) -> usize {
        self.nodes.push(BvhNode::Leaf {
            bounds,
            start,
            count,
        });
        self.nodes.len() - 1
    }

    fn compute_bounds(&self, start: usize, end: usize) -> (Aabb, Aabb) {
        let mut bounds = Aabb::EMPTY;
        let mut centroid_bounds = Aabb::EMPTY;
        for &idx in &self.indices[start..end] {
            bounds = Aabb::surrounding(&bounds, &self.boxes[idx]);
            centroid_bounds = centroid_bounds.include_point(self.centroids[idx]);
        }
        (bounds, centroid_bounds)
    }
}
