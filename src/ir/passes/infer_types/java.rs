//! Type inference over JVM types.
//!
//! Values narrower than an int (`Z`, `C`, `B`, `S`) live as ints on the
//! operand stack, so every type read out of a field, an array or a method
//! return is intified.

use rustc_hash::FxHashMap;

use super::{arg_types, with_arity, FuncType, InferTypes, Signature, TypeSystem};
use crate::{
    collections::ext::{ExtContainer, ExtKey},
    ir::{
        newarray_elem,
        Constant,
        Context,
        Insn,
        IrError,
        IrResult,
        JType,
        MethodRef,
        OpArg,
        OpKey,
        Opcode,
        RawInsn,
        RawOperand,
    },
};

/// JVM types, with [JType::Bottom] as the type of `null`.
pub struct JavaTypes;

impl TypeSystem for JavaTypes {
    type Ty = JType;

    fn parse_ty(token: &str) -> IrResult<JType> { JType::parse(token) }

    fn is_bottom(ty: &JType) -> bool { ty.is_bottom() }

    fn unifies(expected: &JType, actual: &JType) -> bool {
        expected == actual
            || (actual.is_bottom() && expected.is_reference())
            || (expected.is_bottom() && actual.is_reference())
    }
}

/// The JVM method a function is compiled to.
///
/// [OpKey::This] and [OpKey::Arg] are typed from it.
pub struct FunctionMethod;

impl ExtKey for FunctionMethod {
    type Value = MethodRef;

    const NAME: &'static str = "FUNCTION_METHOD";
}

fn function_method(ctx: &Context, insn: Insn) -> IrResult<&MethodRef> {
    let func = insn.owning_func(ctx).ok_or_else(|| {
        IrError::illegal(format!("{} is not in a function", insn.display(ctx)))
    })?;
    func.get_ext_or_err::<FunctionMethod>(ctx)
        .map_err(|err| IrError::from_missing_ext(err, func.name(ctx)))
}

fn bad_operand(ctx: &Context, insn: Insn) -> IrError {
    IrError::illegal(format!("unexpected operand of {}", insn.display(ctx)))
}

fn void_or(ret: Option<&JType>) -> Vec<JType> {
    ret.cloned().map(JType::intify).into_iter().collect()
}

fn const_type(value: &Constant) -> JType {
    match value {
        Constant::Null => JType::Bottom,
        Constant::I32(_) => JType::Int,
        Constant::I64(_) => JType::Long,
        Constant::F32(_) => JType::Float,
        Constant::F64(_) => JType::Double,
        Constant::Str(_) => JType::object("java/lang/String"),
        Constant::Class(_) => JType::object("java/lang/Class"),
    }
}

/// The type named by a class operand, which is an internal name or, for
/// array classes, a descriptor.
fn class_type(name: &str) -> IrResult<JType> {
    if name.starts_with('[') {
        JType::parse(name)
    } else {
        Ok(JType::object(name))
    }
}

fn element_of(ty: &JType) -> IrResult<JType> {
    ty.element_type()
        .cloned()
        .ok_or_else(|| IrError::illegal(format!("{ty} is not an array type")))
}

/// Loads and stores on byte arrays are shared with boolean arrays.
fn check_byte_array(ty: &JType) -> IrResult<()> {
    match ty.element_type() {
        Some(JType::Byte | JType::Boolean) => Ok(()),
        _ => Err(IrError::TypeMismatch {
            expected: "[B".to_string(),
            index: 0,
            actual: ty.to_string(),
        }),
    }
}

fn check_int(args: &[JType], index: usize) -> IrResult<()> {
    if args[index] != JType::Int {
        return Err(IrError::TypeMismatch {
            expected: JType::Int.to_string(),
            index,
            actual: args[index].to_string(),
        });
    }
    Ok(())
}

const OPCODE_SIGNATURES: &[(&str, &[Opcode])] = {
    use Opcode::*;
    &[
        (" -> ", &[Nop]),
        ("a -> ", &[Pop, Putstatic]),
        ("a b -> b a b", &[DupX1]),
        ("a b -> b a", &[Swap]),
        ("I -> J", &[I2l]),
        ("I -> F", &[I2f]),
        ("I -> D", &[I2d]),
        ("F -> I", &[F2i]),
        ("F -> J", &[F2l]),
        ("F -> D", &[F2d]),
        ("D -> J", &[D2l]),
        ("D -> I", &[D2i]),
        ("D -> F", &[D2f]),
        ("J -> D", &[L2d]),
        ("J -> I", &[L2i]),
        ("J -> F", &[L2f]),
        ("I -> I", &[Ineg, I2b, I2c, I2s]),
        ("J -> J", &[Lneg]),
        ("F -> F", &[Fneg]),
        ("D -> D", &[Dneg]),
        (
            " -> I",
            &[
                IconstM1, Iconst0, Iconst1, Iconst2, Iconst3, Iconst4, Iconst5, Bipush, Sipush,
            ],
        ),
        (" -> J", &[Lconst0, Lconst1]),
        (" -> F", &[Fconst0, Fconst1, Fconst2]),
        (" -> D", &[Dconst0, Dconst1]),
        ("[I I I -> ", &[Iastore]),
        ("[C I I -> ", &[Castore]),
        ("[S I I -> ", &[Sastore]),
        ("[F I I -> ", &[Fastore]),
        ("a I b -> ", &[Aastore]),
        ("[J I J -> ", &[Lastore]),
        ("[D I D -> ", &[Dastore]),
        ("[I I -> I", &[Iaload]),
        ("[C I -> I", &[Caload]),
        ("[S I -> I", &[Saload]),
        ("[F I -> F", &[Faload]),
        ("[J I -> J", &[Laload]),
        ("[D I -> D", &[Daload]),
        ("J J -> I", &[Lcmp]),
        ("F F -> I", &[Fcmpg, Fcmpl]),
        ("D D -> I", &[Dcmpg, Dcmpl]),
        (
            "I I -> I",
            &[Iadd, Isub, Imul, Idiv, Irem, Iand, Ior, Ixor, Ishl, Ishr, Iushr],
        ),
        ("J J -> J", &[Ladd, Lsub, Lmul, Ldiv, Lrem, Land, Lor, Lxor]),
        ("F F -> F", &[Fadd, Fsub, Fmul, Fdiv, Frem]),
        ("D D -> D", &[Dadd, Dsub, Dmul, Ddiv, Drem]),
        ("J I -> J", &[Lshl, Lshr, Lushr]),
        ("a -> I", &[Arraylength, Instanceof]),
    ]
};

/// The stack effect of a raw instruction.
enum RawType<'a> {
    Fixed(&'a Signature<JavaTypes>),
    Computed(Box<dyn FuncType<JType>>),
}

impl FuncType<JType> for RawType<'_> {
    fn arity(&self) -> usize {
        match self {
            RawType::Fixed(sig) => sig.arity(),
            RawType::Computed(ty) => ty.arity(),
        }
    }

    fn infer_result(&self, args: &[JType]) -> IrResult<Vec<JType>> {
        match self {
            RawType::Fixed(sig) => sig.infer_result(args),
            RawType::Computed(ty) => ty.infer_result(args),
        }
    }
}

fn produces(arity: usize, results: Vec<JType>) -> RawType<'static> {
    RawType::Computed(Box::new(with_arity(arity, move |_: &[JType]| {
        Ok(results.clone())
    })))
}

struct OpcodeTable {
    fixed: FxHashMap<Opcode, Signature<JavaTypes>>,
}

impl OpcodeTable {
    fn new() -> IrResult<Self> {
        let mut fixed = FxHashMap::default();
        for (sig, opcodes) in OPCODE_SIGNATURES {
            for &opcode in *opcodes {
                fixed.insert(opcode, Signature::parse(sig)?);
            }
        }
        Ok(Self { fixed })
    }

    fn raw_type<'a>(&'a self, raw: &RawInsn) -> IrResult<RawType<'a>> {
        if let Some(sig) = self.fixed.get(&raw.opcode) {
            return Ok(RawType::Fixed(sig));
        }

        let operand_err = || IrError::illegal(format!("unexpected operand of {raw}"));
        let ty = match (raw.opcode, &raw.operand) {
            (
                opcode @ (Opcode::Invokevirtual
                | Opcode::Invokespecial
                | Opcode::Invokestatic
                | Opcode::Invokeinterface
                | Opcode::Invokedynamic),
                RawOperand::Method(method),
            ) => {
                let receiver = !matches!(opcode, Opcode::Invokestatic | Opcode::Invokedynamic);
                produces(
                    method.params.len() + usize::from(receiver),
                    void_or(method.ret.as_ref()),
                )
            }
            (Opcode::Getstatic, RawOperand::Field(field)) => {
                produces(0, vec![field.ty.clone().intify()])
            }
            (Opcode::Getfield, RawOperand::Field(field)) => {
                produces(1, vec![field.ty.clone().intify()])
            }
            (Opcode::New, RawOperand::Class(name)) => produces(0, vec![class_type(name)?]),
            (Opcode::Checkcast, RawOperand::Class(name)) => produces(1, vec![class_type(name)?]),
            (Opcode::Anewarray, RawOperand::Class(name)) => {
                produces(1, vec![JType::array_of(class_type(name)?)])
            }
            (Opcode::Newarray, &RawOperand::Int(code)) => {
                let elem = newarray_elem(code)
                    .ok_or_else(|| IrError::illegal(format!("bad newarray type {code}")))?;
                produces(1, vec![JType::array_of(elem)])
            }
            (Opcode::AconstNull, _) => produces(0, vec![JType::Bottom]),
            (Opcode::Aaload, _) => RawType::Computed(Box::new(with_arity(2, |args: &[JType]| {
                check_int(args, 1)?;
                Ok(vec![element_of(&args[0])?])
            }))),
            (Opcode::Baload, _) => RawType::Computed(Box::new(with_arity(2, |args: &[JType]| {
                check_byte_array(&args[0])?;
                check_int(args, 1)?;
                Ok(vec![JType::Int])
            }))),
            (Opcode::Bastore, _) => RawType::Computed(Box::new(with_arity(3, |args: &[JType]| {
                check_byte_array(&args[0])?;
                check_int(args, 1)?;
                check_int(args, 2)?;
                Ok(vec![])
            }))),
            (
                Opcode::Invokevirtual
                | Opcode::Invokespecial
                | Opcode::Invokestatic
                | Opcode::Invokeinterface
                | Opcode::Invokedynamic
                | Opcode::Getstatic
                | Opcode::Getfield
                | Opcode::New
                | Opcode::Checkcast
                | Opcode::Anewarray
                | Opcode::Newarray,
                _,
            ) => return Err(operand_err()),
            (opcode, _) => {
                return Err(IrError::unsupported(format!("unsupported opcode {opcode}")))
            }
        };
        Ok(ty)
    }

    /// Run the raw instructions over a stack holding the argument types,
    /// returning the final stack.
    fn infer(&self, raws: &[RawInsn], mut stack: Vec<JType>) -> IrResult<Vec<JType>> {
        for raw in raws {
            let ty = self.raw_type(raw)?;
            let arity = ty.arity();
            if stack.len() < arity {
                return Err(IrError::illegal(format!(
                    "stack underflow at {raw}: {} values, {arity} needed",
                    stack.len()
                )));
            }
            let args = stack.split_off(stack.len() - arity);
            stack.extend(ty.infer_result(&args)?);
        }
        Ok(stack)
    }
}

impl InferTypes<JavaTypes> {
    /// Type inference over JVM types, knowing every operator of the IR.
    ///
    /// # Panics
    ///
    /// Panics if a builtin signature does not parse.
    pub fn java() -> Self {
        Self::try_java().unwrap_or_else(|err| panic!("invalid builtin signature: {err}"))
    }

    fn try_java() -> IrResult<Self> {
        let mut infer = Self::new();

        infer.register_signature(OpKey::HandleOf, " -> Ljava/lang/invoke/MethodHandle;")?;
        infer.register_signature(OpKey::Drop, "a -> ")?;
        infer.register_signature(OpKey::Select, "b b I -> b")?;
        infer.register(OpKey::BoolSelect, |_, _| Ok(vec![JType::Int]));
        infer.register(OpKey::Intrinsic, |_, _| {
            Err(IrError::illegal("please lower intrinsics first"))
        });

        infer.register(OpKey::Catch, |ctx, insn| match &insn.op(ctx).arg {
            OpArg::Type(exception) => Ok(vec![exception.clone()]),
            _ => Err(bad_operand(ctx, insn)),
        });

        infer.register(OpKey::Const, |ctx, insn| match &insn.op(ctx).arg {
            OpArg::Const(value) => Ok(vec![const_type(value)]),
            _ => Err(bad_operand(ctx, insn)),
        });

        infer.register(OpKey::GetField, |ctx, insn| match &insn.op(ctx).arg {
            OpArg::Field(field) => Ok(vec![field.ty.clone().intify()]),
            _ => Err(bad_operand(ctx, insn)),
        });

        infer.register(OpKey::PutField, |_, _| Ok(vec![]));
        infer.register(OpKey::ArraySet, |_, _| Ok(vec![]));

        infer.register(OpKey::Invoke, |ctx, insn| {
            let OpArg::Method(method) = &insn.op(ctx).arg else {
                return Err(bad_operand(ctx, insn));
            };
            // only the arity is checked
            let expected = method.arity();
            let actual = insn.args(ctx).len();
            if expected != actual {
                return Err(IrError::illegal(format!(
                    "type mismatch: wrong number of arguments to {method}, expected {expected}, got {actual}"
                )));
            }
            Ok(void_or(method.ret.as_ref()))
        });

        infer.register(OpKey::ArrayGet, |ctx, insn| {
            let array = *insn.args(ctx).first().ok_or_else(|| bad_operand(ctx, insn))?;
            let ty = super::var_type::<JType>(ctx, array)?;
            Ok(vec![element_of(&ty)?.intify()])
        });

        infer.register(OpKey::This, |ctx, insn| {
            let method = function_method(ctx, insn)?;
            Ok(vec![JType::object(method.owner.as_str())])
        });

        infer.register(OpKey::Arg, |ctx, insn| {
            let OpArg::Index(index) = insn.op(ctx).arg else {
                return Err(bad_operand(ctx, insn));
            };
            let method = function_method(ctx, insn)?;
            let param = method.params.get(index as usize).ok_or_else(|| {
                IrError::illegal(format!("{method} has no parameter {index}"))
            })?;
            Ok(vec![param.clone()])
        });

        let opcodes = OpcodeTable::new()?;
        infer.register(OpKey::Insns, move |ctx, insn| {
            let OpArg::Insns(raws) = &insn.op(ctx).arg else {
                return Err(bad_operand(ctx, insn));
            };
            opcodes.infer(raws, arg_types(ctx, insn)?)
        });

        Ok(infer)
    }
}
