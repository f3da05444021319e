mod scan;
mod support;
