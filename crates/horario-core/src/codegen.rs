//! Identifier generation for assignments and matrices.

use std::{
  collections::HashSet,
  sync::atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use crate::assignment::{Candidate, NewAssignment};

/// A fresh matrix id for a batch that did not bring one.
pub fn fresh_matrix_id() -> String { format!("ASGM-{}", Uuid::new_v4().simple()) }

/// Assignment-code generator: `ASG-{n}` where `n` starts at the current
/// wall-clock millisecond and never repeats for the generator's lifetime.
///
/// Every value is at least one past the previous one, so batches drawing
/// from the same generator cannot overlap however close together they run.
/// Values already taken within a batch are skipped.
#[derive(Debug)]
pub struct CodeGenerator {
  last:  AtomicI64,
  clock: fn() -> i64,
}

fn wall_clock_millis() -> i64 { Utc::now().timestamp_millis() }

impl Default for CodeGenerator {
  fn default() -> Self { Self::with_clock(wall_clock_millis) }
}

impl CodeGenerator {
  pub fn new() -> Self { Self::default() }

  /// A generator reading time from `clock` instead of the system.
  pub fn with_clock(clock: fn() -> i64) -> Self {
    Self { last: AtomicI64::new(i64::MIN), clock }
  }

  /// The next counter value: `max(now, previous + 1)`.
  fn tick(&self) -> i64 {
    let now = (self.clock)();
    let previous = self
      .last
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last.saturating_add(1)))
      })
      .unwrap_or_else(|last| last);
    now.max(previous.saturating_add(1))
  }

  /// Give every candidate lacking a code a generated one and turn the batch
  /// into insertable entries. Client-supplied codes are kept as-is.
  pub fn assign(&self, batch: Vec<Candidate>, created_by: &str) -> Vec<NewAssignment> {
    let mut taken: HashSet<String> = batch
      .iter()
      .filter_map(|c| c.code.as_deref())
      .map(str::to_uppercase)
      .collect();

    batch
      .into_iter()
      .map(|mut candidate| {
        let code = match candidate.code.take() {
          Some(code) => code,
          None => self.next_free(&mut taken),
        };
        NewAssignment::from_candidate(candidate, code, created_by)
      })
      .collect()
  }

  fn next_free(&self, taken: &mut HashSet<String>) -> String {
    loop {
      let code = format!("ASG-{}", self.tick());
      if taken.insert(code.to_uppercase()) {
        return code;
      }
    }
  }
}
