pub(crate) mod can;
