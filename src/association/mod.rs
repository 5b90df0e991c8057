// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Association engine: bonding geometry, the bond graph, and cluster walks.

pub mod bias_volume;
pub mod bond_graph;
pub mod error;
pub mod topology;
