pub(crate) mod effect;
