//! Protocol constants for SHADOW.
//!
//! Curve sizes are those of secp256k1; the announcement scheme is ERC-5564
//! scheme 1 and the vault parameters are fixed so existing vaults keep opening.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a secp256k1 private key (scalar) in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a SEC1 compressed public key in bytes.
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Size of a SEC1 uncompressed public key in bytes (0x04 prefix included).
pub const UNCOMPRESSED_PUBLIC_KEY_SIZE: usize = 65;

/// Size of the ECDH shared secret (the x-coordinate of the shared point).
pub const SHARED_SECRET_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// ETHEREUM CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of Ethereum address in bytes (20 bytes = 160 bits).
pub const ETH_ADDRESS_SIZE: usize = 20;

/// Size of keccak256 hash output.
pub const KECCAK256_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH META-ADDRESS & ANNOUNCEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a stealth meta-address: compressed spending key ‖ compressed viewing key.
pub const META_ADDRESS_SIZE: usize = 2 * COMPRESSED_PUBLIC_KEY_SIZE;

/// ERC-5564 scheme id for secp256k1 with view tags. The only scheme scanned.
pub const SCHEME_ID_SECP256K1: u64 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY HIERARCHY
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-hardened child index of the spending key under the BIP-32 root.
pub const SPENDING_KEY_INDEX: u32 = 0;

/// Non-hardened child index of the viewing key under the BIP-32 root.
pub const VIEWING_KEY_INDEX: u32 = 1;

/// Word count used when generating a new mnemonic.
pub const DEFAULT_MNEMONIC_WORDS: usize = 12;

// ═══════════════════════════════════════════════════════════════════════════════
// VAULT PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// PBKDF2-HMAC-SHA256 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Size of the derived AES-256 key.
pub const VAULT_KEY_SIZE: usize = 32;

/// Size of the random PBKDF2 salt.
pub const VAULT_SALT_SIZE: usize = 16;

/// Size of the random CBC initialization vector.
pub const VAULT_IV_SIZE: usize = 16;

/// AES block size; ciphertext length is always a multiple of it.
pub const AES_BLOCK_SIZE: usize = 16;

// ═══════════════════════════════════════════════════════════════════════════════
// PERFORMANCE TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Default batch size for scanning announcements.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 256;

/// Maximum announcements handled by one scan batch.
pub const MAX_SCAN_BATCH_SIZE: usize = 10_000;

/// Default number of scan batches in flight.
pub const DEFAULT_SCAN_WORKERS: usize = 4;
