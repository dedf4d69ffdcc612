pub(crate) mod reconcile;
pub(crate) mod track;
