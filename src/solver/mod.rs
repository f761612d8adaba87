//! Tiled numerical kernels: allocation, GEMM, matvec/matmul scheduling,
//! the Jacobi driver, and result validation.

pub mod gemm;
pub mod init;
pub mod jacobi;
pub mod matmul;
pub mod matvec;
pub mod validate;

pub use gemm::matmul_block;
pub use init::{alloc_init, alloc_zeroed, jacobi_modify};
pub use jacobi::JacobiSolver;
pub use matmul::matmul_tasks;
pub use matvec::matvec_tasks;
pub use validate::{validate, TOLERANCE};
