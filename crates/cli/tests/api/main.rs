
mod ingest;
mod json;
mod register;
