//! Módulo de criptografia para campos sensíveis do prontuário
//!
//! Diagnóstico, prescrições e notas clínicas nunca são persistidos em claro.
//! Cada campo é cifrado com AES-256-GCM e armazenado como texto base64 no
//! formato `nonce(12) || tag(16) || ciphertext`.

use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng as RandOsRng, RngCore};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Erros específicos para operações de criptografia
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Chave de criptografia inválida: {0}")]
    InvalidKey(String),

    #[error("Falha na criptografia")]
    EncryptionFailed,

    /// Texto cifrado adulterado, truncado ou cifrado com outra chave
    #[error("Falha na descriptografia")]
    DecryptionFailed,

    #[error("Dados inválidos: {0}")]
    InvalidData(String),
}

/// Tamanho do nonce em bytes para AES-GCM
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// Tamanho da tag de autenticação em bytes
pub const AES_GCM_TAG_SIZE: usize = 16;

/// Tamanho da chave AES-256 em bytes
pub const KEY_SIZE: usize = 32;

/// Chave AES-256 para criptografia (com zeroização automática)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Cria uma nova chave aleatória
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        RandOsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Cria uma chave a partir de bytes existentes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "A chave deve ter {} bytes, recebeu {}",
                KEY_SIZE,
                bytes.len()
            )));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Decodifica uma chave provisionada em base64
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let mut bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::InvalidKey("base64 inválido".to_string()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Converte para bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(**redacted**)")
    }
}

/// Cifra de campos com chave carregada uma única vez na inicialização.
///
/// Somente leitura após a construção, pode ser compartilhada entre
/// requisições sem bloqueio.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl FieldCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(aes_key),
        }
    }

    /// Cifra o texto e devolve o blob em base64
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();

        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut payload = Vec::with_capacity(AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE + buffer.len());
        payload.extend_from_slice(nonce.as_slice());
        payload.extend_from_slice(tag.as_slice());
        payload.extend_from_slice(&buffer);

        Ok(STANDARD.encode(payload))
    }

    /// Decifra um blob produzido por [`FieldCipher::encrypt`]
    pub fn decrypt(&self, blob: &str) -> Result<String, CryptoError> {
        let payload = STANDARD
            .decode(blob)
            .map_err(|_| CryptoError::InvalidData("base64 inválido".to_string()))?;

        if payload.len() < AES_GCM_NONCE_SIZE + AES_GCM_TAG_SIZE {
            return Err(CryptoError::InvalidData(format!(
                "Texto cifrado curto demais: {} bytes",
                payload.len()
            )));
        }

        let (nonce, rest) = payload.split_at(AES_GCM_NONCE_SIZE);
        let (tag, ciphertext) = rest.split_at(AES_GCM_TAG_SIZE);
        let mut buffer = ciphertext.to_vec();

        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce),
                b"",
                &mut buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(buffer)
            .map_err(|_| CryptoError::InvalidData("texto decifrado não é UTF-8".to_string()))
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher(AES-256-GCM)")
    }
}
