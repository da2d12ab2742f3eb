//! Geração de códigos numéricos de uso único

use rand::rngs::OsRng;
use rand::Rng;

/// Validade de um código emitido, em minutos
pub const OTP_VALIDITY_MINUTES: i64 = 10;

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// Sorteia um código de 6 dígitos a partir do gerador do sistema operacional
pub fn generate_code() -> String {
    OsRng.gen_range(OTP_MIN..=OTP_MAX).to_string()
}
