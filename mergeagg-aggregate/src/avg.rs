//! The `AVG` family.
//!
//! One generic [`AvgFunc`] covers every combination of numeric domain
//! (decimal, float), phase (original, merge) and uniqueness (all, distinct).
//! Distinct aggregation has no merge phase: its partial state is the full
//! value set, so a `(count, sum)` pair cannot represent it. Construction
//! rejects that combination.

use std::collections::HashMap;
use std::marker::PhantomData;

use arrow::datatypes::{DataType, Field, Schema};
use mergeagg_expr::{EvalContext, Row, ScalarExpr};
use mergeagg_result::{Error, Result};

use crate::domain::{AggDomain, DecimalDomain, FloatDomain, NumericDomain};
use crate::func::{AggFunc, AggPhase, OutputMode};
use crate::output::OutputChunk;
use crate::partial::{Accumulator, PartialResult};
use crate::value_set::ValueSet;

/// Field metadata key on an emitted partial sum naming the type of the value
/// column it was summed from.
pub const SOURCE_TYPE_METADATA_KEY: &str = "mergeagg.avg.source_type";

/// Plan-time description of one `AVG` call.
#[derive(Clone, Debug, PartialEq)]
pub struct AvgDescriptor {
    pub phase: AggPhase,
    pub distinct: bool,
    /// Original phase: `[value]`. Merge phase: `[pre_count, pre_sum]`.
    pub args: Vec<ScalarExpr>,
    pub ordinal: usize,
    /// Merge phase only: type of the value column the partial sums were
    /// computed from. When set, the merged result has the same type as a
    /// single-phase average over that column. When unset, it is read from the
    /// pre-sum field's [`SOURCE_TYPE_METADATA_KEY`] metadata, and failing that
    /// derived from the pre-sum column type.
    pub source_type: Option<DataType>,
}

impl AvgDescriptor {
    pub fn original(arg: ScalarExpr, ordinal: usize) -> Self {
        Self {
            phase: AggPhase::Original,
            distinct: false,
            args: vec![arg],
            ordinal,
            source_type: None,
        }
    }

    pub fn original_distinct(arg: ScalarExpr, ordinal: usize) -> Self {
        Self {
            distinct: true,
            ..Self::original(arg, ordinal)
        }
    }

    pub fn merge(pre_count: ScalarExpr, pre_sum: ScalarExpr, ordinal: usize) -> Self {
        Self {
            phase: AggPhase::Merge,
            distinct: false,
            args: vec![pre_count, pre_sum],
            ordinal,
            source_type: None,
        }
    }

    /// Record the type of the value column the partial sums came from.
    pub fn with_source_type(mut self, source_type: DataType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    /// Position of the argument carrying the values (or partial sums).
    fn value_arg_index(&self) -> usize {
        match self.phase {
            AggPhase::Original => 0,
            AggPhase::Merge => 1,
        }
    }
}

/// Build the `AVG` variant described by `desc` over rows shaped like `input_schema`.
///
/// The numeric domain follows the type of the value argument: decimals and
/// integers accumulate exactly, floats as doubles.
pub fn build_avg(
    ctx: &EvalContext,
    input_schema: &Schema,
    mut desc: AvgDescriptor,
) -> Result<Box<dyn AggFunc>> {
    ensure_phase_supported(desc.phase, desc.distinct)?;
    let value_arg = desc.args.get(desc.value_arg_index()).ok_or_else(|| {
        Error::InvalidArgumentError(format!(
            "AVG {} phase expects {} argument(s), got {}",
            desc.phase.name(),
            desc.value_arg_index() + 1,
            desc.args.len()
        ))
    })?;
    let input_type = value_arg.data_type(input_schema)?;

    if desc.phase == AggPhase::Merge {
        let count_type = desc.args[0].data_type(input_schema)?;
        if !(count_type.is_integer() || count_type == DataType::Null) {
            return Err(Error::InvalidArgumentError(format!(
                "AVG merge phase expects an integer partial count, got {count_type:?}"
            )));
        }
    }

    if desc.phase == AggPhase::Merge && desc.source_type.is_none() {
        desc.source_type = recorded_source_type(input_schema, value_arg)?;
    }

    let domain = AggDomain::for_input(&input_type)?;
    if let Some(source_type) = &desc.source_type {
        if desc.phase != AggPhase::Merge {
            return Err(Error::InvalidArgumentError(
                "AVG source type only applies to the merge phase".into(),
            ));
        }
        let source_domain = AggDomain::for_input(source_type)?;
        if source_domain != domain {
            return Err(Error::InvalidArgumentError(format!(
                "AVG source type {source_type:?} does not match partial sum type {input_type:?}"
            )));
        }
    }

    match domain {
        AggDomain::Decimal => Ok(Box::new(AvgFunc::<DecimalDomain>::try_new(
            ctx, desc, input_type,
        )?)),
        AggDomain::Float => Ok(Box::new(AvgFunc::<FloatDomain>::try_new(
            ctx, desc, input_type,
        )?)),
    }
}

fn recorded_source_type(input_schema: &Schema, pre_sum: &ScalarExpr) -> Result<Option<DataType>> {
    let ScalarExpr::Column(ordinal) = pre_sum else {
        return Ok(None);
    };
    let Some(recorded) = input_schema
        .fields()
        .get(*ordinal)
        .and_then(|field| field.metadata().get(SOURCE_TYPE_METADATA_KEY))
    else {
        return Ok(None);
    };
    recorded.parse::<DataType>().map(Some).map_err(|err| {
        Error::InvalidArgumentError(format!(
            "invalid AVG source type {recorded:?} on partial sum column {ordinal}: {err}"
        ))
    })
}

fn ensure_phase_supported(phase: AggPhase, distinct: bool) -> Result<()> {
    if distinct && phase == AggPhase::Merge {
        return Err(Error::Internal(
            "AVG(DISTINCT) cannot run in the merge phase: distinct state is a value set, not a (count, sum) pair"
                .into(),
        ));
    }
    Ok(())
}

/// `AVG` over numeric domain `D`.
#[derive(Debug)]
pub struct AvgFunc<D: NumericDomain> {
    name: String,
    args: Vec<ScalarExpr>,
    ordinal: usize,
    phase: AggPhase,
    distinct: bool,
    input_type: DataType,
    source_type: DataType,
    result_type: DataType,
    _domain: PhantomData<fn() -> D>,
}

impl<D: NumericDomain> AvgFunc<D> {
    /// Construct the variant; `input_type` is the type of the value argument.
    pub fn try_new(ctx: &EvalContext, desc: AvgDescriptor, input_type: DataType) -> Result<Self> {
        ensure_phase_supported(desc.phase, desc.distinct)?;
        let expected = desc.value_arg_index() + 1;
        if desc.args.len() != expected {
            return Err(Error::InvalidArgumentError(format!(
                "AVG {} phase expects {expected} argument(s), got {}",
                desc.phase.name(),
                desc.args.len()
            )));
        }

        let name = format!(
            "avg_{}_{}{}",
            desc.phase.name(),
            if desc.distinct { "distinct_" } else { "" },
            D::NAME
        );
        let source_type = desc.source_type.unwrap_or_else(|| input_type.clone());
        let result_type = D::result_type(ctx, &source_type);
        tracing::debug!(
            name = %name,
            ordinal = desc.ordinal,
            ?input_type,
            ?result_type,
            "constructed aggregate"
        );

        Ok(Self {
            name,
            args: desc.args,
            ordinal: desc.ordinal,
            phase: desc.phase,
            distinct: desc.distinct,
            input_type,
            source_type,
            result_type,
            _domain: PhantomData,
        })
    }

    fn shape_mismatch(&self, found: &'static str) -> Error {
        Error::Internal(format!(
            "{} expects a {} accumulator, found {found}",
            self.name,
            D::NAME
        ))
    }

    fn accumulator<'a>(&self, pr: &'a PartialResult) -> Result<&'a Accumulator<D>> {
        D::accumulator(pr).ok_or_else(|| self.shape_mismatch(pr.domain_name()))
    }

    fn accumulator_mut<'a>(&self, pr: &'a mut PartialResult) -> Result<&'a mut Accumulator<D>> {
        let found = pr.domain_name();
        D::accumulator_mut(pr).ok_or_else(|| self.shape_mismatch(found))
    }

    fn update_original(
        &self,
        ctx: &EvalContext,
        rows: &[Row<'_>],
        acc: &mut Accumulator<D>,
    ) -> Result<()> {
        let arg = &self.args[0];
        for row in rows {
            let Some(value) = D::eval(arg, ctx, row)? else {
                continue;
            };
            if acc.dedup.as_ref().is_some_and(|set| set.exist(&value)) {
                continue;
            }

            acc.sum = D::add(acc.sum, value)?;
            acc.count += 1;
            if let Some(set) = acc.dedup.as_mut() {
                set.insert(value);
            }
        }
        Ok(())
    }

    fn update_merge(
        &self,
        ctx: &EvalContext,
        rows: &[Row<'_>],
        acc: &mut Accumulator<D>,
    ) -> Result<()> {
        let (count_arg, sum_arg) = (&self.args[0], &self.args[1]);
        for row in rows {
            let Some(pre_sum) = D::eval(sum_arg, ctx, row)? else {
                continue;
            };
            let Some(pre_count) = count_arg.eval_int(ctx, row)? else {
                continue;
            };
            if pre_count < 0 {
                return Err(Error::InvalidArgumentError(format!(
                    "partial AVG count must not be negative, got {pre_count}"
                )));
            }

            let count = checked_count_add(acc.count, pre_count)?;
            acc.sum = D::add(acc.sum, pre_sum)?;
            acc.count = count;
        }
        Ok(())
    }
}

fn checked_count_add(lhs: i64, rhs: i64) -> Result<i64> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::Arithmetic(format!("AVG count overflow adding {rhs} to {lhs}")))
}

impl<D: NumericDomain> AggFunc for AvgFunc<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> usize {
        self.ordinal
    }

    fn phase(&self) -> AggPhase {
        self.phase
    }

    fn is_distinct(&self) -> bool {
        self.distinct
    }

    fn result_type(&self) -> &DataType {
        &self.result_type
    }

    fn output_fields(&self, mode: OutputMode) -> Vec<(usize, Field)> {
        match mode {
            OutputMode::Final => vec![(
                self.ordinal,
                Field::new(&self.name, self.result_type.clone(), true),
            )],
            OutputMode::Partial => vec![
                (
                    self.ordinal,
                    Field::new(format!("{}_count", self.name), DataType::Int64, true),
                ),
                (
                    self.ordinal + 1,
                    Field::new(
                        format!("{}_sum", self.name),
                        D::partial_sum_type(&self.input_type),
                        true,
                    )
                    .with_metadata(HashMap::from([(
                        SOURCE_TYPE_METADATA_KEY.to_string(),
                        self.source_type.to_string(),
                    )])),
                ),
            ],
        }
    }

    fn allocate(&self) -> PartialResult {
        D::wrap(Accumulator::new(self.distinct))
    }

    fn reset(&self, pr: &mut PartialResult) {
        let reusable = D::accumulator(pr).is_some_and(|acc| acc.is_distinct() == self.distinct);
        if !reusable {
            *pr = self.allocate();
            return;
        }
        if let Some(acc) = D::accumulator_mut(pr) {
            acc.reset();
        }
    }

    fn update(&self, ctx: &EvalContext, rows: &[Row<'_>], pr: &mut PartialResult) -> Result<()> {
        let acc = self.accumulator_mut(pr)?;
        match self.phase {
            AggPhase::Original => self.update_original(ctx, rows, acc),
            AggPhase::Merge => self.update_merge(ctx, rows, acc),
        }
    }

    fn finalize(
        &self,
        ctx: &EvalContext,
        pr: &PartialResult,
        output: &mut OutputChunk,
    ) -> Result<()> {
        let acc = self.accumulator(pr)?;
        if acc.count == 0 {
            return output.append_null(self.ordinal);
        }
        let avg = D::divide(ctx, &self.result_type, acc.sum, acc.count)?;
        D::append(output, self.ordinal, avg)
    }

    fn append_partial_result(&self, pr: &PartialResult, output: &mut OutputChunk) -> Result<()> {
        if self.distinct {
            return Err(Error::Internal(format!(
                "{} cannot emit a (count, sum) partial result",
                self.name
            )));
        }
        let acc = self.accumulator(pr)?;
        output.append_int(self.ordinal, acc.count)?;
        if acc.count == 0 {
            return output.append_null(self.ordinal + 1);
        }
        D::append(output, self.ordinal + 1, acc.sum)
    }

    fn merge_partial_result(&self, src: &PartialResult, dst: &mut PartialResult) -> Result<()> {
        let src = self.accumulator(src)?;
        let dst = self.accumulator_mut(dst)?;
        match (src.dedup.as_ref(), dst.dedup.as_mut()) {
            (None, None) => {
                let count = checked_count_add(dst.count, src.count)?;
                dst.sum = D::add(dst.sum, src.sum)?;
                dst.count = count;
            }
            (Some(src_set), Some(dst_set)) => {
                for value in src_set.values() {
                    if dst_set.exist(&value) {
                        continue;
                    }
                    dst.sum = D::add(dst.sum, value)?;
                    dst.count += 1;
                    dst_set.insert(value);
                }
            }
            _ => {
                return Err(Error::Internal(format!(
                    "{} cannot merge distinct and non-distinct accumulators",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
