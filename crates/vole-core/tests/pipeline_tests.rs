// Pipeline tests — normalize → infer → dispatch without any real kernels

use std::sync::Arc;

use vole_core::{
    Attributes, DType, Device, DeviceKind, Error, Kernel, KernelKey, KernelRegistry, OpCall,
    OpKind, Result, Shape, Tensor, TensorDesc,
};

fn desc(dims: &[usize], dtype: DType) -> TensorDesc {
    TensorDesc::new(dims, dtype, Device::Cpu)
}

fn cross_call(x: TensorDesc, y: TensorDesc, attrs: Attributes) -> Result<OpCall> {
    OpCall::prepare(OpKind::Cross, vec![x, y], attrs)
}

// A kernel that only records which key it was reached through.
fn tagging_kernel(tag: f64) -> Arc<dyn Kernel> {
    Arc::new(
        move |_: &[&Tensor], _: &Attributes, outputs: &[TensorDesc]| -> Result<Vec<Tensor>> {
            Ok(outputs.iter().map(|d| Tensor::full(d.clone(), tag)).collect())
        },
    )
}

#[test]
fn test_negative_axis_resolves() {
    let x = desc(&[3, 3], DType::F32);
    let call = cross_call(x.clone(), x, Attributes::new().int("axis", -2)).unwrap();
    assert_eq!(call.attrs.get_int("axis").unwrap(), Some(0));
}

#[test]
fn test_default_axis_is_first_length_three() {
    let x = desc(&[2, 3, 3], DType::F64);
    let call = cross_call(x.clone(), x.clone(), Attributes::new()).unwrap();
    assert_eq!(call.attrs.get_int("axis").unwrap(), Some(1));
    assert_eq!(call.outputs, vec![x]);
}

#[test]
fn test_axis_out_of_range() {
    let x = desc(&[3, 3], DType::F32);
    for axis in [2, -3] {
        let err = cross_call(x.clone(), x.clone(), Attributes::new().int("axis", axis)).unwrap_err();
        assert_eq!(err, Error::InvalidAxis { axis, rank: 2 });
    }
}

#[test]
fn test_no_axis_of_length_three() {
    let x = desc(&[2, 4], DType::F32);
    let err = cross_call(x.clone(), x, Attributes::new()).unwrap_err();
    assert_eq!(
        err,
        Error::NoSizeThreeAxis {
            shape: Shape::from((2, 4))
        }
    );
}

#[test]
fn test_axis_not_length_three() {
    let x = desc(&[3, 4], DType::F32);
    let err = cross_call(x.clone(), x, Attributes::new().int("axis", 1)).unwrap_err();
    assert_eq!(
        err,
        Error::AxisLength {
            axis: 1,
            expected: 3,
            got: 4
        }
    );
}

#[test]
fn test_shape_and_rank_mismatch() {
    let err = cross_call(
        desc(&[4, 3], DType::F32),
        desc(&[5, 3], DType::F32),
        Attributes::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));

    let err = cross_call(
        desc(&[3], DType::F32),
        desc(&[1, 3], DType::F32),
        Attributes::new().int("axis", -1),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_dtype_and_device_mismatch() {
    let err = cross_call(
        desc(&[3], DType::F32),
        desc(&[3], DType::F64),
        Attributes::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::DtypeMismatch {
            expected: DType::F32,
            got: DType::F64
        }
    );

    let err = cross_call(
        desc(&[3], DType::F32),
        TensorDesc::new(3usize, DType::F32, Device::Cuda(0)),
        Attributes::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::DevicePlacement {
            expected: Device::Cpu,
            got: Device::Cuda(0)
        }
    );
}

#[test]
fn test_normalization_is_idempotent() {
    let x = desc(&[5, 3], DType::F32);
    let first = OpCall::prepare(
        OpKind::Slice,
        vec![x.clone()],
        Attributes::new().int("axis", -2).int("start", -4).int("end", -1),
    )
    .unwrap();
    assert_eq!(first.outputs[0].dims(), &[3, 3]);
    let second = OpCall::prepare(OpKind::Slice, vec![x], first.attrs.clone()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_dispatch_selects_by_device_and_dtype() {
    let mut reg = KernelRegistry::new();
    reg.register(
        KernelKey::new(OpKind::Cross, DeviceKind::Cpu, DType::F32),
        tagging_kernel(1.0),
    )
    .unwrap();
    reg.register(
        KernelKey::new(OpKind::Cross, DeviceKind::Cuda, DType::F32),
        tagging_kernel(2.0),
    )
    .unwrap();

    let cpu = Tensor::zeros(desc(&[3], DType::F32));
    let call = cross_call(cpu.desc().clone(), cpu.desc().clone(), Attributes::new()).unwrap();
    let out = reg.dispatch_call(&call, &[&cpu, &cpu]).unwrap();
    assert_eq!(out[0].to_f64_vec().unwrap(), vec![1.0; 3]);

    let gpu = cpu.to_device(Device::Cuda(1));
    let call = cross_call(gpu.desc().clone(), gpu.desc().clone(), Attributes::new()).unwrap();
    let out = reg.dispatch_call(&call, &[&gpu, &gpu]).unwrap();
    assert_eq!(out[0].to_f64_vec().unwrap(), vec![2.0; 3]);
    assert_eq!(out[0].device(), Device::Cuda(1));
}

#[test]
fn test_unsupported_kernel_names_the_key() {
    let reg = KernelRegistry::new();
    let x = Tensor::zeros(desc(&[3], DType::BF16));
    let call = cross_call(x.desc().clone(), x.desc().clone(), Attributes::new()).unwrap();
    let err = reg.dispatch_call(&call, &[&x, &x]).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedKernel(KernelKey::new(OpKind::Cross, DeviceKind::Cpu, DType::BF16))
    );
    let msg = err.to_string();
    assert!(msg.contains("cross"));
    assert!(msg.contains("bfloat16"));
}

#[test]
fn test_register_for_many_dtypes() {
    let mut reg = KernelRegistry::new();
    reg.register_for(
        OpKind::Conj,
        DeviceKind::Cpu,
        &[DType::F32, DType::F64],
        tagging_kernel(0.0),
    )
    .unwrap();
    assert_eq!(reg.len(), 2);
    let err = reg
        .register_for(OpKind::Conj, DeviceKind::Cpu, &[DType::F64], tagging_kernel(0.0))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRegistration(_)));
}
