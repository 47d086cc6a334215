pub(crate) mod striped;

pub(crate) use striped::StripedMap;
