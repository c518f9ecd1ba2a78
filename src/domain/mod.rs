// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs and traits describing click-through-rate
// data. Nothing here touches burn, the filesystem, or tensors.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Declares the name, vocabulary size and shape of one feature column
pub mod field;

// One labelled impression: feature columns plus a click label
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
