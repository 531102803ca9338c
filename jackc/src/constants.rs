//! Fixed names of the target platform.

/// File extension of source files.
pub const SOURCE_EXT: &str = "jack";

/// File extension of generated VM code.
pub const OUTPUT_EXT: &str = "vm";

/// Heap allocation routine called by constructors.
///
/// Takes the number of words to allocate and returns the base address.
pub const MEMORY_ALLOC: &str = "Memory.alloc";

/// The VM has no multiply or divide instruction, so
/// both are lowered to calls into the math library.
pub const MATH_MULTIPLY: &str = "Math.multiply";
pub const MATH_DIVIDE: &str = "Math.divide";

/// String constructor, takes the maximum length.
pub const STRING_NEW: &str = "String.new";
/// Appends one character code to a string, returns the string.
pub const STRING_APPEND_CHAR: &str = "String.appendChar";

/// Name of the implicit object argument of methods.
pub const THIS: &str = "this";
