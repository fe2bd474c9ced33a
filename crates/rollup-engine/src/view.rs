// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rollup_core::Result;
use tracing::{debug, instrument};

use crate::{MapReduceActions, ViewDeletion};

impl MapReduceActions<'_, '_> {
	/// Drops every mapped result, reduced result, scheduled reduction, reduce
	/// key stat and recorded reduce type of a view. Other views are left untouched.
	#[instrument(name = "engine::view::delete", level = "debug", skip(self))]
	pub fn delete_view(&mut self, view: &str) -> Result<ViewDeletion> {
		let deltas = self.delete_mapped_results_for_view(view)?;
		let mapped_results: usize = deltas.values().map(|delta| delta.unsigned_abs() as usize).sum();
		self.apply_reduce_key_deltas(view, &deltas)?;

		let deletion = ViewDeletion {
			mapped_results,
			reduced_results: self.delete_reduced_results_for_view(view)?,
			scheduled_reductions: self.delete_scheduled_for_view(view)?,
			reduce_key_stats: self.delete_stats_for_view(view)?,
			reduce_types: self.delete_reduce_types_for_view(view)?,
		};

		debug!(
			mapped = deletion.mapped_results,
			reduced = deletion.reduced_results,
			scheduled = deletion.scheduled_reductions,
			stats = deletion.reduce_key_stats,
			reduce_types = deletion.reduce_types,
			"deleted view"
		);
		Ok(deletion)
	}
}
