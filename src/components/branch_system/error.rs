use thiserror::Error;

/// Structural problems found while building a [`super::BranchSystem`].
#[derive(Debug, Error)]
pub enum DatasetError {
	/// The JSON did not match the dataset shape.
	#[error("invalid dataset JSON: {0}")]
	Parse(#[from] serde_json::Error),

	/// No node has type `root`.
	#[error("dataset has no node of type `root`")]
	MissingRoot,

	/// More than one node has type `root`.
	#[error("dataset has more than one root: `{first}` and `{second}`")]
	MultipleRoots {
		/// Id of the first root found.
		first: String,
		/// Id of the next one.
		second: String,
	},

	/// Two nodes share an id.
	#[error("duplicate node id `{0}`")]
	DuplicateId(String),

	/// A parent id names no node, under [`super::OrphanPolicy::Reject`].
	#[error("node `{node}` names unknown parent `{parent}`")]
	UnknownParent {
		/// Id of the orphaned node.
		node: String,
		/// The parent id it names.
		parent: String,
	},

	/// Following parents from this node never reaches the root.
	#[error("node `{0}` is not connected to the root (parent cycle)")]
	ParentCycle(String),
}
