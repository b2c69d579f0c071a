pub(crate) mod realtime;
