/// A contiguous range of the total unit count, mapped 1:1 to one pool
/// task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
  pub index: usize,
  pub start: u64,
  pub len: u64,
}

/// Partitions `[0, total_units)` into `ceil(total / chunk_size)` chunks
/// of `chunk_size` units, the last chunk carrying any remainder.
///
/// A zero `chunk_size` is rejected by config validation before dispatch;
/// the planner still guards it and returns an empty plan.
pub fn plan_chunks(total_units: u64, chunk_size: u64) -> Vec<Chunk> {
  if total_units == 0 || chunk_size == 0 {
    return Vec::new();
  }
  let chunk_count = total_units.div_ceil(chunk_size);
  (0..chunk_count)
    .map(|i| {
      let start = i * chunk_size;
      Chunk {
        index: i as usize,
        start,
        len: chunk_size.min(total_units - start),
      }
    })
    .collect()
}
