// -
// Wire protocol

/// Reserved payload a client sends to keep its connection alive. Never answered.
pub const HEARTBEAT_TOKEN: &[u8] = b"HEARTBEAT";

/// Separates `<parameter>` from `<opcode>` in a request.
pub const REQUEST_SEPARATOR: char = '#';

/// Upper bound of a single read from a client socket.
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Field delimiter inside a multi-record response.
pub const FIELD_DELIMITER: &str = " | ";

// -
// Literal responses

pub const WRONG_OPTION: &str = "WRONG OPTION";
pub const RESULT_IS_NULL: &str = "Result is NULL !";

// -
// Opcodes

pub const OPCODE_LIST_ALL: i64 = 0;
pub const OPCODE_BY_YEAR: i64 = 1;
pub const OPCODE_BY_AUTHOR: i64 = 2;
