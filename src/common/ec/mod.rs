mod galois;
mod poly;

use poly::Poly;

// Reed-Solomon encoder
//------------------------------------------------------------------------------

/// Computes the `ec_len` error correction codewords for one data block:
/// the remainder of message * x^ec_len divided by the generator polynomial.
pub(crate) fn ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    let message = Poly::from_bytes(data).mul(&Poly::monomial(1, ec_len));
    let generator = Poly::generator(ec_len);
    message.rem(&generator).tail_bytes(ec_len)
}
